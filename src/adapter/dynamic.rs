use std::sync::Arc;

use super::{
    AccessError, Arity, Element, MemberDescriptor, MessageType, MessageView, PrimitiveKind, Scalar,
    SequenceView,
};

/// Member payload of a [`DynamicMessage`].
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    Boolean(bool),
    Char(u8),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    Message(DynamicMessage),
    Sequence(Vec<DynamicValue>),
}

impl DynamicValue {
    fn default_for(kind: PrimitiveKind, nested: Option<&Arc<MessageType>>) -> Self {
        match kind {
            PrimitiveKind::Boolean => DynamicValue::Boolean(false),
            PrimitiveKind::Char => DynamicValue::Char(0),
            PrimitiveKind::Int8
            | PrimitiveKind::Int16
            | PrimitiveKind::Int32
            | PrimitiveKind::Int64 => DynamicValue::Signed(0),
            PrimitiveKind::Octet
            | PrimitiveKind::Uint8
            | PrimitiveKind::Uint16
            | PrimitiveKind::Uint32
            | PrimitiveKind::Uint64 => DynamicValue::Unsigned(0),
            PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::LongDouble => {
                DynamicValue::Float(0.0)
            }
            PrimitiveKind::String | PrimitiveKind::WString => DynamicValue::String(String::new()),
            PrimitiveKind::WChar => DynamicValue::Unsigned(0),
            PrimitiveKind::Message => DynamicValue::Message(DynamicMessage::new(
                nested
                    .cloned()
                    .unwrap_or_else(|| Arc::new(MessageType::new("", Vec::new()))),
            )),
        }
    }

    fn for_member(member: &MemberDescriptor) -> Self {
        let single = || Self::default_for(member.kind, member.nested.as_ref());
        match member.arity {
            Arity::Single => single(),
            Arity::Array(length) => DynamicValue::Sequence((0..length).map(|_| single()).collect()),
            Arity::BoundedSequence(_) | Arity::Sequence => DynamicValue::Sequence(Vec::new()),
        }
    }

    fn as_element(&self) -> Element<'_> {
        match self {
            DynamicValue::Boolean(v) => Element::Scalar(Scalar::Boolean(*v)),
            DynamicValue::Char(v) => Element::Scalar(Scalar::Char(*v)),
            DynamicValue::Signed(v) => Element::Scalar(Scalar::Signed(*v)),
            DynamicValue::Unsigned(v) => Element::Scalar(Scalar::Unsigned(*v)),
            DynamicValue::Float(v) => Element::Scalar(Scalar::Float(*v)),
            DynamicValue::String(v) => Element::Scalar(Scalar::String(v)),
            DynamicValue::Message(message) => Element::Message(message),
            DynamicValue::Sequence(items) => Element::Sequence(items),
        }
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        DynamicValue::Boolean(value)
    }
}

impl From<i32> for DynamicValue {
    fn from(value: i32) -> Self {
        DynamicValue::Signed(value.into())
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        DynamicValue::Signed(value)
    }
}

impl From<u8> for DynamicValue {
    fn from(value: u8) -> Self {
        DynamicValue::Unsigned(value.into())
    }
}

impl From<u32> for DynamicValue {
    fn from(value: u32) -> Self {
        DynamicValue::Unsigned(value.into())
    }
}

impl From<u64> for DynamicValue {
    fn from(value: u64) -> Self {
        DynamicValue::Unsigned(value)
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        DynamicValue::Float(value)
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        DynamicValue::String(value.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        DynamicValue::String(value)
    }
}

impl From<DynamicMessage> for DynamicValue {
    fn from(value: DynamicMessage) -> Self {
        DynamicValue::Message(value)
    }
}

impl<T: Into<DynamicValue>> From<Vec<T>> for DynamicValue {
    fn from(values: Vec<T>) -> Self {
        DynamicValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

/// An owned instance laid out by a [`MessageType`]. Members start at their
/// zero value; fixed arrays start fully populated, sequences empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    message_type: Arc<MessageType>,
    values: Vec<DynamicValue>,
}

impl DynamicMessage {
    pub fn new(message_type: Arc<MessageType>) -> Self {
        let values = message_type
            .members
            .iter()
            .map(DynamicValue::for_member)
            .collect();
        Self {
            message_type,
            values,
        }
    }

    pub fn message_type(&self) -> &Arc<MessageType> {
        &self.message_type
    }

    /// Replaces a member's payload. The payload is not checked against the
    /// member's kind; mismatches surface as access failures on evaluation.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<DynamicValue>,
    ) -> Result<&mut Self, AccessError> {
        *self.member_mut(name)? = value.into();
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&DynamicValue> {
        let (index, _) = self.message_type.find_member(name)?;
        self.values.get(index)
    }

    pub fn member_mut(&mut self, name: &str) -> Result<&mut DynamicValue, AccessError> {
        let index = self
            .message_type
            .find_member(name)
            .map(|(index, _)| index)
            .ok_or_else(|| AccessError::MissingMember {
                member: name.to_string(),
            })?;
        self.values
            .get_mut(index)
            .ok_or_else(|| AccessError::MissingMember {
                member: name.to_string(),
            })
    }
}

impl MessageView for DynamicMessage {
    fn locate(&self, index: usize, member: &MemberDescriptor) -> Result<Element<'_>, AccessError> {
        let missing = || AccessError::MissingMember {
            member: member.name.clone(),
        };
        let declared = self.message_type.member(index).ok_or_else(missing)?;
        if declared.name != member.name {
            return Err(missing());
        }
        Ok(self.values.get(index).ok_or_else(missing)?.as_element())
    }
}

impl SequenceView for Vec<DynamicValue> {
    fn runtime_length(&self) -> usize {
        self.len()
    }

    fn element_at(
        &self,
        index: usize,
        member: &MemberDescriptor,
    ) -> Result<Element<'_>, AccessError> {
        self.get(index)
            .map(DynamicValue::as_element)
            .ok_or_else(|| AccessError::IndexOutOfBounds {
                member: member.name.clone(),
                index,
                length: self.len(),
            })
    }
}
