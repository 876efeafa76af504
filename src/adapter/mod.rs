//! # Message Descriptor Adapter
//!
//! Reflective access to message instances. A [`MessageType`] describes the
//! layout; a [`MessageView`] hands out typed, bounds-checked handles to the
//! members of one instance. Field paths are resolved against the descriptor
//! once and replayed against views on every evaluation.
//!
//! Two views ship with the crate: [`DynamicMessage`] and `serde_json::Value`.

pub mod descriptor;
pub mod dynamic;
pub mod json;

pub use descriptor::{Arity, MemberDescriptor, MessageType, PrimitiveKind};
pub use dynamic::{DynamicMessage, DynamicValue};

use thiserror::Error;

/// A primitive read from an instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Boolean(bool),
    Char(u8),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    String(&'a str),
}

impl Scalar<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            Scalar::Boolean(_) => "boolean",
            Scalar::Char(_) => "char",
            Scalar::Signed(_) => "signed integer",
            Scalar::Unsigned(_) => "unsigned integer",
            Scalar::Float(_) => "floating point",
            Scalar::String(_) => "string",
        }
    }
}

/// Handle to one member of an instance.
#[derive(Clone, Copy)]
pub enum Element<'a> {
    Scalar(Scalar<'a>),
    Message(&'a dyn MessageView),
    Sequence(&'a dyn SequenceView),
}

impl<'a> Element<'a> {
    pub fn into_message(self, member: &str) -> Result<&'a dyn MessageView, AccessError> {
        match self {
            Element::Message(message) => Ok(message),
            _ => Err(AccessError::NotAMessage {
                member: member.to_string(),
            }),
        }
    }

    pub fn into_sequence(self, member: &str) -> Result<&'a dyn SequenceView, AccessError> {
        match self {
            Element::Sequence(sequence) => Ok(sequence),
            _ => Err(AccessError::NotASequence {
                member: member.to_string(),
            }),
        }
    }

    pub fn into_scalar(self, member: &str) -> Result<Scalar<'a>, AccessError> {
        match self {
            Element::Scalar(scalar) => Ok(scalar),
            Element::Message(_) => Err(AccessError::KindMismatch {
                expected: format!("primitive member '{}'", member),
                found: "message".to_string(),
            }),
            Element::Sequence(_) => Err(AccessError::KindMismatch {
                expected: format!("primitive member '{}'", member),
                found: "sequence".to_string(),
            }),
        }
    }
}

/// A structured instance whose members can be located by descriptor.
pub trait MessageView {
    /// Locates the member at `index` of this instance's type. `member` is the
    /// descriptor of that member, as bound.
    fn locate(&self, index: usize, member: &MemberDescriptor) -> Result<Element<'_>, AccessError>;
}

/// An array or sequence member of an instance.
pub trait SequenceView {
    fn runtime_length(&self) -> usize;

    /// Element at `index`. Callers check `index < runtime_length()` first.
    fn element_at(&self, index: usize, member: &MemberDescriptor)
        -> Result<Element<'_>, AccessError>;
}

/// Evaluation-time access failures. These never reach callers of `evaluate`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    #[error("Member not present in instance: {member}")]
    MissingMember { member: String },

    #[error("Index {index} out of bounds for '{member}' with length {length}")]
    IndexOutOfBounds {
        member: String,
        index: usize,
        length: usize,
    },

    #[error("Kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: String, found: String },

    #[error("Member '{member}' is not a message")]
    NotAMessage { member: String },

    #[error("Member '{member}' is not an array or sequence")]
    NotASequence { member: String },
}
