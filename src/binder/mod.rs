//! # Identifier Binder
//!
//! Resolves dotted and indexed field names against a [`MessageType`] once, at
//! build time, producing a [`FieldPath`] that evaluation replays against
//! instances.

pub mod error;

pub use error::BindError;

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::adapter::{Arity, MemberDescriptor, MessageType};
use crate::ast::{FieldName, PathSegment};
use crate::field::{FieldAccessor, FieldPath};

#[derive(Debug, Clone)]
pub struct Binder {
    root: Arc<MessageType>,
}

impl Binder {
    pub fn new(root: Arc<MessageType>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Arc<MessageType> {
        &self.root
    }

    #[instrument(level = "debug", skip(self, name), fields(field = %name))]
    pub fn resolve(&self, name: &FieldName) -> Result<FieldPath, BindError> {
        let mut owner = self.root.clone();
        let mut accessors = Vec::with_capacity(name.segments.len());
        let mut segments = name.segments.iter().peekable();

        while let Some(segment) = segments.next() {
            let (member_index, member) =
                owner
                    .find_member(&segment.name)
                    .ok_or_else(|| BindError::FieldNotFound {
                        name: segment.name.clone(),
                        position: segment.position,
                    })?;
            let array_index = check_subscripts(segment, member)?;

            let Some(next) = segments.peek() else {
                let primitive = member.kind;
                let kind = primitive
                    .value_kind()
                    .ok_or_else(|| BindError::UnsupportedType {
                        name: name.to_string(),
                        kind: primitive,
                        position: segment.position,
                    })?;
                accessors.push(FieldAccessor {
                    member_index,
                    array_index,
                    owner: owner.clone(),
                });
                let path = FieldPath::new(accessors, primitive, kind, name.to_string());
                debug!("bound {} as {}", path.signature(), kind);
                return Ok(path);
            };

            // Only structured members can be descended into
            let nested = match (member.is_structured(), &member.nested) {
                (true, Some(nested)) => nested.clone(),
                _ => {
                    return Err(BindError::FieldNotFound {
                        name: next.name.clone(),
                        position: next.position,
                    })
                }
            };
            accessors.push(FieldAccessor {
                member_index,
                array_index,
                owner: owner.clone(),
            });
            owner = nested;
        }

        Err(BindError::FieldNotFound {
            name: name.to_string(),
            position: name.position(),
        })
    }
}

fn check_subscripts(
    segment: &PathSegment,
    member: &MemberDescriptor,
) -> Result<Option<usize>, BindError> {
    match (member.arity, segment.subscripts.as_slice()) {
        (Arity::Single, []) => Ok(None),
        (Arity::Single, [subscript, ..]) => Err(BindError::UnexpectedIndex {
            name: segment.name.clone(),
            position: subscript.position,
        }),
        (_, []) => Err(BindError::MissingIndex {
            name: segment.name.clone(),
            position: segment.position,
        }),
        // Dynamically bounded members are checked per instance
        (arity, [subscript]) if arity.is_dynamically_bounded() => Ok(Some(subscript.index)),
        (arity, [subscript]) => match arity.fixed_bound() {
            Some(bound) if subscript.index >= bound => Err(BindError::IndexOutOfRange {
                name: segment.name.clone(),
                index: subscript.index,
                bound,
                position: subscript.position,
            }),
            _ => Ok(Some(subscript.index)),
        },
        (_, [_, extra, ..]) => Err(BindError::UnexpectedIndex {
            name: segment.name.clone(),
            position: extra.position,
        }),
    }
}
