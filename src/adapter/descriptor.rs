use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::value::ValueKind;

/// Primitive tag of a member, as reported by the type system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PrimitiveKind {
    Boolean,
    Char,
    Octet,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
    LongDouble,
    String,
    WChar,
    WString,
    Message,
}

impl PrimitiveKind {
    /// Value kind a terminal member of this tag binds to. `None` for tags that
    /// cannot be compared (structured and wide-character kinds).
    pub fn value_kind(self) -> Option<ValueKind> {
        match self {
            PrimitiveKind::Boolean => Some(ValueKind::Boolean),
            PrimitiveKind::Char => Some(ValueKind::Char),
            PrimitiveKind::String => Some(ValueKind::String),
            PrimitiveKind::Int8
            | PrimitiveKind::Int16
            | PrimitiveKind::Int32
            | PrimitiveKind::Int64 => Some(ValueKind::SignedInteger),
            PrimitiveKind::Octet
            | PrimitiveKind::Uint8
            | PrimitiveKind::Uint16
            | PrimitiveKind::Uint32
            | PrimitiveKind::Uint64 => Some(ValueKind::UnsignedInteger),
            PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::LongDouble => {
                Some(ValueKind::FloatingPoint)
            }
            PrimitiveKind::WChar | PrimitiveKind::WString | PrimitiveKind::Message => None,
        }
    }
}

/// How many elements a member holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    #[default]
    Single,
    /// Fixed length array.
    Array(usize),
    /// Sequence with an upper bound; actual length varies per instance.
    BoundedSequence(usize),
    Sequence,
}

impl Arity {
    pub fn is_indexed(self) -> bool {
        !matches!(self, Arity::Single)
    }

    /// Bound that can be checked when binding.
    pub fn fixed_bound(self) -> Option<usize> {
        match self {
            Arity::Array(bound) => Some(bound),
            _ => None,
        }
    }

    pub fn is_dynamically_bounded(self) -> bool {
        matches!(self, Arity::BoundedSequence(_) | Arity::Sequence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: PrimitiveKind,
    #[serde(default)]
    pub arity: Arity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Arc<MessageType>>,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind,
            arity: Arity::Single,
            nested: None,
        }
    }

    pub fn message(name: impl Into<String>, nested: Arc<MessageType>) -> Self {
        Self {
            name: name.into(),
            kind: PrimitiveKind::Message,
            arity: Arity::Single,
            nested: Some(nested),
        }
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn is_structured(&self) -> bool {
        self.kind == PrimitiveKind::Message
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageType {
    pub name: String,
    pub members: Vec<MemberDescriptor>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Library {
    One(MessageType),
    Many(Vec<MessageType>),
}

impl MessageType {
    pub fn new(name: impl Into<String>, members: Vec<MemberDescriptor>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, index: usize) -> Option<&MemberDescriptor> {
        self.members.get(index)
    }

    pub fn find_member(&self, name: &str) -> Option<(usize, &MemberDescriptor)> {
        self.members
            .iter()
            .enumerate()
            .find(|(_, member)| member.name == name)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses either a single type or an array of types.
    pub fn library_from_json_str(json: &str) -> Result<Vec<Self>, ConfigError> {
        Ok(match serde_json::from_str(json)? {
            Library::One(message_type) => vec![message_type],
            Library::Many(types) => types,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind_mapping() {
        assert_eq!(PrimitiveKind::Int16.value_kind(), Some(ValueKind::SignedInteger));
        assert_eq!(PrimitiveKind::Octet.value_kind(), Some(ValueKind::UnsignedInteger));
        assert_eq!(PrimitiveKind::LongDouble.value_kind(), Some(ValueKind::FloatingPoint));
        assert_eq!(PrimitiveKind::WString.value_kind(), None);
        assert_eq!(PrimitiveKind::Message.value_kind(), None);
    }

    #[test]
    fn test_arity_bounds() {
        assert_eq!(Arity::Array(3).fixed_bound(), Some(3));
        assert_eq!(Arity::BoundedSequence(3).fixed_bound(), None);
        assert!(Arity::BoundedSequence(3).is_dynamically_bounded());
        assert!(!Arity::Single.is_indexed());
    }

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "name": "Sample",
            "members": [
                { "name": "id", "kind": "uint32" },
                { "name": "scores", "kind": "double", "arity": { "array": 4 } },
                { "name": "tags", "kind": "string", "arity": "sequence" },
                { "name": "inner", "kind": "message", "nested": {
                    "name": "Inner", "members": [ { "name": "flag", "kind": "boolean" } ]
                } }
            ]
        }"#;
        let message_type = MessageType::from_json_str(json).unwrap();
        assert_eq!(message_type.member_count(), 4);
        assert_eq!(message_type.members[1].arity, Arity::Array(4));
        assert_eq!(message_type.members[2].arity, Arity::Sequence);
        let (index, inner) = message_type.find_member("inner").unwrap();
        assert_eq!(index, 3);
        assert!(inner.is_structured());
        assert_eq!(inner.nested.as_ref().unwrap().name, "Inner");
    }

    #[test]
    fn test_library_accepts_one_or_many() {
        let one = r#"{ "name": "A", "members": [] }"#;
        let many = r#"[{ "name": "A", "members": [] }, { "name": "B", "members": [] }]"#;
        assert_eq!(MessageType::library_from_json_str(one).unwrap().len(), 1);
        assert_eq!(MessageType::library_from_json_str(many).unwrap().len(), 2);
        assert!(MessageType::library_from_json_str("{").is_err());
    }
}
