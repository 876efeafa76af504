//! `serde_json::Value` as a message instance: an object keyed by member name,
//! arrays for indexed members, one-character strings for `char` members.

use serde_json::Value;

use super::{AccessError, Element, MemberDescriptor, MessageView, PrimitiveKind, Scalar, SequenceView};

fn read_element<'a>(value: &'a Value, member: &MemberDescriptor) -> Result<Element<'a>, AccessError> {
    let mismatch = |expected: &str| AccessError::KindMismatch {
        expected: format!("{} for '{}'", expected, member.name),
        found: describe(value).to_string(),
    };
    let scalar = match member.kind {
        PrimitiveKind::Message => return Ok(Element::Message(value)),
        PrimitiveKind::Boolean => Scalar::Boolean(value.as_bool().ok_or_else(|| mismatch("boolean"))?),
        PrimitiveKind::Char => match value.as_str().map(str::as_bytes) {
            Some([byte]) => Scalar::Char(*byte),
            _ => return Err(mismatch("single character")),
        },
        PrimitiveKind::String | PrimitiveKind::WString => {
            Scalar::String(value.as_str().ok_or_else(|| mismatch("string"))?)
        }
        PrimitiveKind::Int8
        | PrimitiveKind::Int16
        | PrimitiveKind::Int32
        | PrimitiveKind::Int64 => Scalar::Signed(value.as_i64().ok_or_else(|| mismatch("integer"))?),
        PrimitiveKind::Octet
        | PrimitiveKind::Uint8
        | PrimitiveKind::Uint16
        | PrimitiveKind::Uint32
        | PrimitiveKind::Uint64
        | PrimitiveKind::WChar => {
            Scalar::Unsigned(value.as_u64().ok_or_else(|| mismatch("unsigned integer"))?)
        }
        PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::LongDouble => {
            Scalar::Float(value.as_f64().ok_or_else(|| mismatch("number"))?)
        }
    };
    Ok(Element::Scalar(scalar))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl MessageView for Value {
    fn locate(&self, _index: usize, member: &MemberDescriptor) -> Result<Element<'_>, AccessError> {
        let object = self.as_object().ok_or_else(|| AccessError::NotAMessage {
            member: member.name.clone(),
        })?;
        let value = object
            .get(&member.name)
            .ok_or_else(|| AccessError::MissingMember {
                member: member.name.clone(),
            })?;
        if member.arity.is_indexed() {
            let items = value.as_array().ok_or_else(|| AccessError::NotASequence {
                member: member.name.clone(),
            })?;
            return Ok(Element::Sequence(items));
        }
        read_element(value, member)
    }
}

impl SequenceView for Vec<Value> {
    fn runtime_length(&self) -> usize {
        self.len()
    }

    fn element_at(
        &self,
        index: usize,
        member: &MemberDescriptor,
    ) -> Result<Element<'_>, AccessError> {
        let value = self.get(index).ok_or_else(|| AccessError::IndexOutOfBounds {
            member: member.name.clone(),
            index,
            length: self.len(),
        })?;
        read_element(value, member)
    }
}
