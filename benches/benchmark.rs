use std::sync::Arc;

use content_filter::{
    parse_filter_expression, Arity, DynamicMessage, FilterExpression, MemberDescriptor,
    MessageType, PrimitiveKind,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const FILTER: &str =
    "count > %0 AND (label LIKE 'probe-%' OR samples[3] BETWEEN -10 AND 10) AND NOT muted = TRUE";

fn bench_type() -> Arc<MessageType> {
    Arc::new(MessageType::new(
        "Bench",
        vec![
            MemberDescriptor::new("count", PrimitiveKind::Int32),
            MemberDescriptor::new("label", PrimitiveKind::String),
            MemberDescriptor::new("samples", PrimitiveKind::Int64).with_arity(Arity::Sequence),
            MemberDescriptor::new("muted", PrimitiveKind::Boolean),
        ],
    ))
}

fn bench_message(message_type: &Arc<MessageType>) -> DynamicMessage {
    let mut message = DynamicMessage::new(message_type.clone());
    message
        .set("count", 42)
        .and_then(|m| m.set("label", "gauge-3"))
        .and_then(|m| m.set("samples", vec![5i64, -3, 8, 2, 0]))
        .expect("bench message");
    message
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse filter", |b| {
        b.iter(|| parse_filter_expression(black_box(FILTER)))
    });
}

fn bench_build(c: &mut Criterion) {
    let message_type = bench_type();
    c.bench_function("build filter", |b| {
        b.iter(|| FilterExpression::build(black_box(FILTER), &message_type, &["10"]))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let message_type = bench_type();
    let message = bench_message(&message_type);
    let mut expression =
        FilterExpression::build(FILTER, &message_type, &["10"]).expect("bench filter");
    c.bench_function("evaluate filter", |b| {
        b.iter(|| expression.evaluate(black_box(&message)))
    });
}

criterion_group!(benches, bench_parse, bench_build, bench_evaluate);
criterion_main!(benches);
