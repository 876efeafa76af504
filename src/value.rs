//! # Value Model
//!
//! The scalar datum shared by fields, parameters and literals. A [`Value`] has a
//! kind fixed at bind time and a `has_value` flag that is cleared at the start of
//! every evaluation pass; only the payload and the flag ever change afterwards.
//!
//! Comparison rules:
//! - `BOOLEAN`, `CHAR` and `STRING` only compare with their own kind
//!   (strings byte-wise, no locale).
//! - `SIGNED_INTEGER`, `UNSIGNED_INTEGER` and `FLOATING_POINT` compare with
//!   each other. Two integers compare exactly; anything involving a float is
//!   promoted to `f64`.

use core::fmt;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::adapter::{AccessError, Scalar};

/// Longest string payload a value can hold, in bytes.
pub const MAX_STRING_LENGTH: usize = 255;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Char,
    String,
    SignedInteger,
    UnsignedInteger,
    FloatingPoint,
}

impl ValueKind {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueKind::SignedInteger | ValueKind::UnsignedInteger | ValueKind::FloatingPoint
        )
    }

    /// Whether two kinds may appear on both sides of a comparison.
    pub fn is_compatible_with(self, other: ValueKind) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }
}

/// Typed payload of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Boolean(bool),
    Char(u8),
    String(String),
    SignedInteger(i64),
    UnsignedInteger(u64),
    FloatingPoint(f64),
}

impl Datum {
    pub fn kind(&self) -> ValueKind {
        match self {
            Datum::Boolean(_) => ValueKind::Boolean,
            Datum::Char(_) => ValueKind::Char,
            Datum::String(_) => ValueKind::String,
            Datum::SignedInteger(_) => ValueKind::SignedInteger,
            Datum::UnsignedInteger(_) => ValueKind::UnsignedInteger,
            Datum::FloatingPoint(_) => ValueKind::FloatingPoint,
        }
    }

    /// Zero payload for a kind.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Boolean => Datum::Boolean(false),
            ValueKind::Char => Datum::Char(0),
            ValueKind::String => Datum::String(String::new()),
            ValueKind::SignedInteger => Datum::SignedInteger(0),
            ValueKind::UnsignedInteger => Datum::UnsignedInteger(0),
            ValueKind::FloatingPoint => Datum::FloatingPoint(0.0),
        }
    }

    /// Converts the datum to `kind` when that is a widening. A single char
    /// widens to a one byte string; every kind widens to itself.
    pub fn widened_to(self, kind: ValueKind) -> Option<Datum> {
        match (self, kind) {
            (datum, kind) if datum.kind() == kind => Some(datum),
            (Datum::Char(byte), ValueKind::String) => Some(Datum::String(char::from(byte).to_string())),
            _ => None,
        }
    }

    /// Orders two payloads. `None` for incompatible kinds and NaN.
    pub fn compare(&self, other: &Datum) -> Option<Ordering> {
        match (self, other) {
            (Datum::Boolean(a), Datum::Boolean(b)) => Some(a.cmp(b)),
            (Datum::Char(a), Datum::Char(b)) => Some(a.cmp(b)),
            (Datum::String(a), Datum::String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Datum::SignedInteger(a), Datum::SignedInteger(b)) => Some(a.cmp(b)),
            (Datum::UnsignedInteger(a), Datum::UnsignedInteger(b)) => Some(a.cmp(b)),
            (Datum::SignedInteger(a), Datum::UnsignedInteger(b)) => Some(compare_mixed(*a, *b)),
            (Datum::UnsignedInteger(a), Datum::SignedInteger(b)) => {
                Some(compare_mixed(*b, *a).reverse())
            }
            (a, b) => a.as_float()?.partial_cmp(&b.as_float()?),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Datum::SignedInteger(v) => Some(*v as f64),
            Datum::UnsignedInteger(v) => Some(*v as f64),
            Datum::FloatingPoint(v) => Some(*v),
            _ => None,
        }
    }
}

fn compare_mixed(signed: i64, unsigned: u64) -> Ordering {
    u64::try_from(signed).map_or(Ordering::Less, |signed| signed.cmp(&unsigned))
}

/// Renders the datum in literal syntax, so the output parses back to the same datum.
impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Boolean(true) => write!(f, "TRUE"),
            Datum::Boolean(false) => write!(f, "FALSE"),
            Datum::Char(byte) => write!(f, "'{}'", char::from(*byte)),
            Datum::String(s) => write!(f, "'{}'", s),
            Datum::SignedInteger(v) => write!(f, "{}", v),
            Datum::UnsignedInteger(v) => write!(f, "{}", v),
            Datum::FloatingPoint(v) => write!(f, "{:?}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    datum: Datum,
    has_value: bool,
}

impl Value {
    /// A value of `kind` waiting for data.
    pub fn unset(kind: ValueKind) -> Self {
        Self {
            datum: Datum::default_for(kind),
            has_value: false,
        }
    }

    /// A value that always holds `datum`.
    pub fn constant(datum: Datum) -> Self {
        Self {
            datum,
            has_value: true,
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.datum.kind()
    }

    pub fn has_value(&self) -> bool {
        self.has_value
    }

    pub fn datum(&self) -> Option<&Datum> {
        self.has_value.then_some(&self.datum)
    }

    pub fn reset(&mut self) {
        self.has_value = false;
    }

    /// Stores a scalar read from a message instance, converting it to this
    /// value's kind. The kind never changes; a scalar that cannot be
    /// represented leaves the value unset.
    pub fn assign(&mut self, scalar: Scalar<'_>) -> Result<(), AccessError> {
        let kind = self.kind();
        let mismatch = || AccessError::KindMismatch {
            expected: kind.to_string(),
            found: scalar.describe().to_string(),
        };
        match (&mut self.datum, scalar) {
            (Datum::Boolean(slot), Scalar::Boolean(v)) => *slot = v,
            (Datum::Char(slot), Scalar::Char(v)) => *slot = v,
            (Datum::String(slot), Scalar::String(v)) => {
                slot.clear();
                slot.push_str(truncate(v, MAX_STRING_LENGTH));
            }
            (Datum::SignedInteger(slot), Scalar::Signed(v)) => *slot = v,
            (Datum::SignedInteger(slot), Scalar::Unsigned(v)) => {
                *slot = i64::try_from(v).map_err(|_| mismatch())?
            }
            (Datum::UnsignedInteger(slot), Scalar::Unsigned(v)) => *slot = v,
            (Datum::UnsignedInteger(slot), Scalar::Signed(v)) => {
                *slot = u64::try_from(v).map_err(|_| mismatch())?
            }
            (Datum::FloatingPoint(slot), Scalar::Float(v)) => *slot = v,
            (Datum::FloatingPoint(slot), Scalar::Signed(v)) => *slot = v as f64,
            (Datum::FloatingPoint(slot), Scalar::Unsigned(v)) => *slot = v as f64,
            _ => return Err(mismatch()),
        }
        self.has_value = true;
        Ok(())
    }

    /// Orders two values. Defined only when both hold data of compatible kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        self.datum()?.compare(other.datum()?)
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
