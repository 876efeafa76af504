//! Bound field references.
//!
//! A [`FieldPath`] is the bind-time resolution of a field name; a [`Field`]
//! owns one path plus the value read through it during the current pass.
//! Identical paths in one expression share a single `Field`.

use std::sync::Arc;

use crate::adapter::{AccessError, MemberDescriptor, MessageType, MessageView, PrimitiveKind, Scalar};
use crate::condition::ConditionId;
use crate::value::{Value, ValueKind};

/// One step of a field path.
#[derive(Debug, Clone)]
pub struct FieldAccessor {
    pub member_index: usize,
    pub array_index: Option<usize>,
    // Type that declares the member
    pub owner: Arc<MessageType>,
}

impl FieldAccessor {
    pub fn member(&self) -> Result<&MemberDescriptor, AccessError> {
        self.owner
            .member(self.member_index)
            .ok_or_else(|| AccessError::MissingMember {
                member: format!("{}#{}", self.owner.name, self.member_index),
            })
    }
}

#[derive(Debug, Clone)]
pub struct FieldPath {
    accessors: Vec<FieldAccessor>,
    primitive: PrimitiveKind,
    kind: ValueKind,
    signature: String,
}

impl FieldPath {
    pub fn new(
        accessors: Vec<FieldAccessor>,
        primitive: PrimitiveKind,
        kind: ValueKind,
        signature: String,
    ) -> Self {
        Self {
            accessors,
            primitive,
            kind,
            signature,
        }
    }

    pub fn accessors(&self) -> &[FieldAccessor] {
        &self.accessors
    }

    pub fn primitive(&self) -> PrimitiveKind {
        self.primitive
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Canonical text of the path, e.g. `data.names[0]`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Replays the path against an instance and returns the terminal scalar.
    /// Indexes into sequences are checked against the instance's actual length.
    pub fn resolve<'m>(&self, message: &'m dyn MessageView) -> Result<Scalar<'m>, AccessError> {
        let mut current = message;
        let last = self.accessors.len().saturating_sub(1);
        for (step, accessor) in self.accessors.iter().enumerate() {
            let member = accessor.member()?;
            let mut element = current.locate(accessor.member_index, member)?;
            if let Some(index) = accessor.array_index {
                let sequence = element.into_sequence(&member.name)?;
                let length = sequence.runtime_length();
                if index >= length {
                    return Err(AccessError::IndexOutOfBounds {
                        member: member.name.clone(),
                        index,
                        length,
                    });
                }
                element = sequence.element_at(index, member)?;
            }
            if step == last {
                return element.into_scalar(&member.name);
            }
            current = element.into_message(&member.name)?;
        }
        Err(AccessError::MissingMember {
            member: self.signature.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    path: FieldPath,
    value: Value,
    // Predicates to notify when the value changes
    parents: Vec<ConditionId>,
}

impl Field {
    pub fn new(path: FieldPath) -> Self {
        let value = Value::unset(path.kind());
        Self {
            path,
            value,
            parents: Vec::new(),
        }
    }

    pub fn add_parent(&mut self, parent: ConditionId) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    pub fn parents(&self) -> &[ConditionId] {
        &self.parents
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn signature(&self) -> &str {
        self.path.signature()
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn reset(&mut self) {
        self.value.reset();
    }

    /// Reads this field from an instance. On failure the field stays unset.
    pub fn load(&mut self, message: &dyn MessageView) -> Result<(), AccessError> {
        let scalar = self.path.resolve(message)?;
        self.value.assign(scalar)
    }
}
