use thiserror::Error;

use crate::adapter::PrimitiveKind;
use crate::parser::ParseError;
use crate::value::ValueKind;

/// Errors raised while binding an expression to a message type.
///
/// Binding is all or nothing: any of these aborts the build and leaves a
/// previously bound expression untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    #[error("Field not found: {name} at position {position}")]
    FieldNotFound { name: String, position: usize },

    #[error("Field {name} is an array or sequence and needs an index at position {position}")]
    MissingIndex { name: String, position: usize },

    #[error("Field {name} is not an array or sequence, unexpected index at position {position}")]
    UnexpectedIndex { name: String, position: usize },

    #[error("Index {index} is out of range for {name} with bound {bound} at position {position}")]
    IndexOutOfRange {
        name: String,
        index: usize,
        bound: usize,
        position: usize,
    },

    #[error("Field {name} has unsupported type {kind} at position {position}")]
    UnsupportedType {
        name: String,
        kind: PrimitiveKind,
        position: usize,
    },

    #[error("Type mismatch: {left} cannot be compared with {right} at position {position}")]
    TypeMismatch {
        left: ValueKind,
        right: ValueKind,
        position: usize,
    },

    #[error("Parameter %{index} referenced at position {position} but only {supplied} supplied")]
    ParameterOutOfRange {
        index: usize,
        supplied: usize,
        position: usize,
    },

    #[error("Parameter %{index} ('{value}') is not a literal: {reason}")]
    InvalidParameter {
        index: usize,
        value: String,
        reason: ParseError,
    },

    #[error("Too many parameters: {count} supplied, at most {max} allowed")]
    TooManyParameters { count: usize, max: usize },

    #[error("Invalid pattern '{pattern}' at position {position}: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: String,
        position: usize,
    },
}

impl BindError {
    /// Byte offset in the filter text of the offending token, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            BindError::FieldNotFound { position, .. }
            | BindError::MissingIndex { position, .. }
            | BindError::UnexpectedIndex { position, .. }
            | BindError::IndexOutOfRange { position, .. }
            | BindError::UnsupportedType { position, .. }
            | BindError::TypeMismatch { position, .. }
            | BindError::ParameterOutOfRange { position, .. }
            | BindError::InvalidPattern { position, .. } => Some(*position),
            BindError::InvalidParameter { .. } | BindError::TooManyParameters { .. } => None,
        }
    }
}
