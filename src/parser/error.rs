//! Parser error types.
//!
//! Combinators report a [`SyntaxFault`], which keeps the span it failed at.
//! Entry points convert it into the public [`ParseError`] carrying a byte
//! offset into the filter text.

use nom::error::{ContextError, ErrorKind, FromExternalError};
use thiserror::Error;

use super::Span;
use crate::value::MAX_STRING_LENGTH;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error(
        "String literal at position {position} is {length} bytes long, at most {} allowed",
        MAX_STRING_LENGTH
    )]
    LiteralTooLong { position: usize, length: usize },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::Syntax { position, .. } | ParseError::LiteralTooLong { position, .. } => {
                *position
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FaultKind {
    Nom(ErrorKind),
    // What was expected at the span
    Context(&'static str),
    LiteralTooLong(usize),
    InvalidNumber,
}

/// Internal nom error: where parsing stopped and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxFault<'a> {
    pub span: Span<'a>,
    pub kind: FaultKind,
}

impl<'a> SyntaxFault<'a> {
    pub fn new(span: Span<'a>, kind: FaultKind) -> Self {
        Self { span, kind }
    }

    fn found(&self) -> String {
        match self.span.fragment().chars().next() {
            Some(c) => format!("'{}'", c),
            None => "end of input".to_string(),
        }
    }
}

impl<'a> nom::error::ParseError<Span<'a>> for SyntaxFault<'a> {
    fn from_error_kind(input: Span<'a>, kind: ErrorKind) -> Self {
        Self::new(input, FaultKind::Nom(kind))
    }

    fn append(_input: Span<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    // Report the alternative that got furthest
    fn or(self, other: Self) -> Self {
        if other.span.location_offset() >= self.span.location_offset() {
            other
        } else {
            self
        }
    }
}

impl<'a> ContextError<Span<'a>> for SyntaxFault<'a> {
    fn add_context(_input: Span<'a>, ctx: &'static str, mut other: Self) -> Self {
        if let FaultKind::Nom(_) = other.kind {
            other.kind = FaultKind::Context(ctx);
        }
        other
    }
}

impl<'a, E> FromExternalError<Span<'a>, E> for SyntaxFault<'a> {
    fn from_external_error(input: Span<'a>, _kind: ErrorKind, _e: E) -> Self {
        Self::new(input, FaultKind::InvalidNumber)
    }
}

impl From<SyntaxFault<'_>> for ParseError {
    fn from(fault: SyntaxFault<'_>) -> Self {
        let position = fault.span.location_offset();
        let message = match &fault.kind {
            FaultKind::LiteralTooLong(length) => {
                return ParseError::LiteralTooLong {
                    position,
                    length: *length,
                }
            }
            FaultKind::Context(expected) => format!("expected {}, found {}", expected, fault.found()),
            FaultKind::Nom(_) => format!("unexpected {}", fault.found()),
            FaultKind::InvalidNumber => "numeric literal out of range".to_string(),
        };
        ParseError::Syntax { position, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::error::ParseError as _;

    #[test]
    fn test_or_keeps_furthest_fault() {
        let text = Span::new("abc");
        let near = SyntaxFault::from_error_kind(text, ErrorKind::Tag);
        let far = SyntaxFault::from_error_kind(nom::Slice::slice(&text, 2..), ErrorKind::Digit);
        let kept = near.clone().or(far.clone());
        assert_eq!(kept, far);
        assert_eq!(far.or(near).span.location_offset(), 2);
    }

    #[test]
    fn test_context_names_expectation() {
        let text = Span::new(")");
        let fault = SyntaxFault::add_context(
            text,
            "operand",
            SyntaxFault::from_error_kind(text, ErrorKind::Alt),
        );
        let error = ParseError::from(fault);
        assert_eq!(
            error,
            ParseError::Syntax {
                position: 0,
                message: "expected operand, found ')'".to_string()
            }
        );
    }
}
