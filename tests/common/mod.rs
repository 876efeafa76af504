#![allow(dead_code)]

use std::sync::Arc;

use content_filter::{Arity, DynamicMessage, MemberDescriptor, MessageType, PrimitiveKind};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub fn data_type() -> Arc<MessageType> {
    Arc::new(MessageType::new(
        "Data",
        vec![
            MemberDescriptor::new("names", PrimitiveKind::String).with_arity(Arity::Sequence),
            MemberDescriptor::new("id", PrimitiveKind::Uint32),
        ],
    ))
}

pub fn basic_types() -> Arc<MessageType> {
    Arc::new(MessageType::new(
        "BasicTypes",
        vec![
            MemberDescriptor::new("bool_value", PrimitiveKind::Boolean),
            MemberDescriptor::new("char_value", PrimitiveKind::Char),
            MemberDescriptor::new("int32_value", PrimitiveKind::Int32),
            MemberDescriptor::new("int64_value", PrimitiveKind::Int64),
            MemberDescriptor::new("uint64_value", PrimitiveKind::Uint64),
            MemberDescriptor::new("double_value", PrimitiveKind::Double),
            MemberDescriptor::new("string_value", PrimitiveKind::String),
            MemberDescriptor::new("int_array", PrimitiveKind::Int32).with_arity(Arity::Array(3)),
            MemberDescriptor::new("bounded", PrimitiveKind::Int32)
                .with_arity(Arity::BoundedSequence(4)),
            MemberDescriptor::new("values", PrimitiveKind::Int32).with_arity(Arity::Sequence),
            MemberDescriptor::message("data", data_type()),
            MemberDescriptor::new("a", PrimitiveKind::Boolean),
            MemberDescriptor::new("b", PrimitiveKind::Boolean),
            MemberDescriptor::new("c", PrimitiveKind::Boolean),
        ],
    ))
}

/// A populated instance: `int32_value = 4`, `string_value = 'hello'`,
/// `bounded` with two elements, `values` empty and
/// `data.names = ['first', 'second']`.
pub fn basic_message() -> DynamicMessage {
    let mut data = DynamicMessage::new(data_type());
    data.set("names", vec!["first", "second"])
        .unwrap()
        .set("id", 7u32)
        .unwrap();

    let mut message = DynamicMessage::new(basic_types());
    message
        .set("bool_value", true)
        .unwrap()
        .set("int32_value", 4)
        .unwrap()
        .set("int64_value", -5i64)
        .unwrap()
        .set("uint64_value", u64::MAX)
        .unwrap()
        .set("double_value", 2.5)
        .unwrap()
        .set("string_value", "hello")
        .unwrap()
        .set("int_array", vec![10, 20, 30])
        .unwrap()
        .set("bounded", vec![1, 2])
        .unwrap()
        .set("data", data)
        .unwrap();
    message
}

pub fn with_flags(a: bool, b: bool, c: bool) -> DynamicMessage {
    let mut message = basic_message();
    message
        .set("a", a)
        .unwrap()
        .set("b", b)
        .unwrap()
        .set("c", c)
        .unwrap();
    message
}
