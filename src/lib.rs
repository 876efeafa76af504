//! # Content Filter
//!
//! SQL-like content filter expressions evaluated against reflected message
//! instances, deciding accept or reject without deserializing whole messages.
//!
//! ```text
//! count > %0 AND (data.names[0] = 'first' OR NOT flag = TRUE)
//! ```
//!
//! ## Processing Pipeline
//!
//! ```text
//! Text → Parser → AST → Binder → Condition Tree → Evaluator
//! ```
//!
//! ### Stage 1: Parsing
//!
//! The [`parser`] module turns filter text into an [`ast::Expression`] with nom
//! combinators. Literals are typed as they are parsed; syntax errors carry the
//! byte offset of the offending token.
//!
//! ### Stage 2: Binding
//!
//! The [`binder`] resolves each dotted and indexed field name against a
//! [`adapter::MessageType`] once, producing a [`field::FieldPath`]. Parameters
//! (`%0`, `%1`, ...) are parsed with the literal grammar and type-checked
//! against the operands they meet.
//!
//! ### Stage 3: Condition Tree
//!
//! The [`expression`] module lowers the AST into a [`condition::ConditionTree`],
//! an arena of predicates and `NOT`/`AND`/`OR` compounds. Identical field
//! paths share one [`field::Field`].
//!
//! ### Stage 4: Evaluation
//!
//! The [`evaluator`] loads fields one at a time through the [`adapter`] traits
//! and propagates tri-state decisions up the tree, stopping as soon as the
//! root is decided. Anything left undecided rejects the message.
//!
//! ## Filter Handles
//!
//! [`factory::FilterFactory`] creates, updates and recycles filters, backed by
//! an [`pool::ExpressionPool`]. [`content_filter::ContentFilter`] is the
//! mutex-guarded handle a subscriber holds.

pub mod adapter;
pub mod ast;
pub mod binder;
pub mod condition;
pub mod config;
pub mod content_filter;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod factory;
pub mod field;
pub mod parameter;
pub mod parser;
pub mod pattern;
pub mod pool;
pub mod value;

// Re-exports
pub use adapter::{
    AccessError, Arity, DynamicMessage, DynamicValue, MemberDescriptor, MessageType, MessageView,
    PrimitiveKind,
};
pub use binder::BindError;
pub use config::{ConfigError, FilterConfig};
pub use content_filter::ContentFilter;
pub use error::{Error, FilterResult};
pub use expression::FilterExpression;
pub use factory::{Filter, FilterFactory};
pub use parser::{parse_filter_expression, parse_literal_value, ParseError};
pub use pool::ExpressionPool;
pub use value::{Datum, Value, ValueKind};
