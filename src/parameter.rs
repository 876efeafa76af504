//! Externally supplied parameters (`%0`, `%1`, ...).

use crate::binder::BindError;
use crate::parser::parse_literal_value;
use crate::value::{Datum, Value, ValueKind};

#[derive(Debug, Clone)]
pub struct Parameter {
    // Text as supplied, returned by introspection
    source: String,
    value: Value,
    // Kinds of the operands this parameter is compared with
    uses: Vec<ValueKind>,
    position: Option<usize>,
}

impl Parameter {
    /// Parses every supplied string with the literal grammar.
    pub fn parse_all<S: AsRef<str>>(sources: &[S]) -> Result<Vec<(String, Datum)>, BindError> {
        sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let source = source.as_ref();
                parse_literal_value(source)
                    .map(|datum| (source.to_string(), datum))
                    .map_err(|reason| BindError::InvalidParameter {
                        index,
                        value: source.to_string(),
                        reason,
                    })
            })
            .collect()
    }

    /// Fixes the parameter's kind against the operands it meets. A char
    /// widens to a string when it only meets strings.
    pub fn settle(
        source: String,
        datum: Datum,
        uses: Vec<ValueKind>,
        position: Option<usize>,
    ) -> Result<Self, BindError> {
        let datum = match datum {
            Datum::Char(byte)
                if uses.contains(&ValueKind::String) && !uses.contains(&ValueKind::Char) =>
            {
                Datum::String(char::from(byte).to_string())
            }
            datum => datum,
        };
        if let Some(expected) = uses
            .iter()
            .copied()
            .find(|kind| !datum.kind().is_compatible_with(*kind))
        {
            return Err(BindError::TypeMismatch {
                left: expected,
                right: datum.kind(),
                position: position.unwrap_or_default(),
            });
        }
        Ok(Self {
            source,
            value: Value::constant(datum),
            uses,
            position,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn uses(&self) -> &[ValueKind] {
        &self.uses
    }

    /// Position of the first reference in the filter text.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn is_referenced(&self) -> bool {
        self.position.is_some()
    }
}
