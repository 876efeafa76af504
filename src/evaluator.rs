//! # Evaluator
//!
//! One evaluation pass over a message instance:
//!
//! 1. Reset every condition and field.
//! 2. Decide the predicates that read no fields.
//! 3. Load fields in order of first appearance, notifying the predicates that
//!    read each one, until the root is decided.
//!
//! Field access failures are not errors here. The field simply stays unset,
//! its predicates stay undecided, and an undecided root rejects the message.

use tracing::trace;

use crate::adapter::MessageView;
use crate::condition::{ConditionState, Operands};
use crate::expression::FilterExpression;

impl FilterExpression {
    /// Whether `message` passes the filter. An unbound expression accepts
    /// nothing.
    pub fn evaluate(&mut self, message: &dyn MessageView) -> bool {
        if !self.is_bound() {
            return false;
        }

        self.tree.reset();
        for field in &mut self.fields {
            field.reset();
        }
        self.tree.seed(&Operands {
            fields: &self.fields,
            parameters: &self.parameters,
        });

        for id in 0..self.fields.len() {
            if self.tree.root_state().is_decided() {
                break;
            }
            let Some(field) = self.fields.get_mut(id) else {
                break;
            };
            if let Err(e) = field.load(message) {
                trace!("field {} not available: {}", field.signature(), e);
                continue;
            }

            let operands = Operands {
                fields: &self.fields,
                parameters: &self.parameters,
            };
            for parent in self.fields[id].parents() {
                self.tree.value_changed(*parent, &operands);
            }
        }

        let state = self.tree.root_state();
        trace!("evaluated '{}' to {}", self.text, state);
        state == ConditionState::True
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapter::{Arity, DynamicMessage, MemberDescriptor, MessageType, PrimitiveKind};

    fn sample_type() -> Arc<MessageType> {
        Arc::new(MessageType::new(
            "Sample",
            vec![
                MemberDescriptor::new("count", PrimitiveKind::Int32),
                MemberDescriptor::new("ratio", PrimitiveKind::Double),
                MemberDescriptor::new("name", PrimitiveKind::String),
                MemberDescriptor::new("values", PrimitiveKind::Uint64)
                    .with_arity(Arity::Sequence),
            ],
        ))
    }

    fn message(count: i32, values: Vec<u64>) -> DynamicMessage {
        let mut message = DynamicMessage::new(sample_type());
        message
            .set("count", count)
            .unwrap()
            .set("values", values)
            .unwrap()
            .set("name", "abc")
            .unwrap();
        message
    }

    fn expression(text: &str, parameters: &[&str]) -> FilterExpression {
        FilterExpression::build(text, &sample_type(), parameters).unwrap()
    }

    #[test]
    fn test_numeric_parameter() {
        let mut filter = expression("count = %0", &["4"]);
        assert!(!filter.evaluate(&message(3, vec![])));
        assert!(filter.evaluate(&message(4, vec![])));
    }

    #[test]
    fn test_unbound_expression_rejects() {
        let mut filter = FilterExpression::default();
        assert!(!filter.evaluate(&message(4, vec![])));
    }

    #[test]
    fn test_or_short_circuits_past_failed_field() {
        let mut filter = expression("count = 1 OR values[5] = 2", &[]);
        assert!(filter.evaluate(&message(1, vec![])));
        assert!(!filter.evaluate(&message(2, vec![])));
    }

    #[test]
    fn test_failed_field_fails_closed() {
        let mut filter = expression("values[1] <> 7", &[]);
        assert!(!filter.evaluate(&message(0, vec![7])));
        assert!(filter.evaluate(&message(0, vec![7, 8])));

        let mut negated = expression("NOT values[1] = 7", &[]);
        assert!(!negated.evaluate(&message(0, vec![7])));
    }

    #[test]
    fn test_root_decided_stops_loading_fields() {
        let mut filter = expression("count = 1 AND values[0] = 2", &[]);
        assert!(!filter.evaluate(&message(0, vec![2])));
        assert!(!filter.field("values[0]").unwrap().value().has_value());
    }

    #[test]
    fn test_constant_predicates() {
        let mut always = expression("1 = 1 OR count = 5", &[]);
        assert!(always.evaluate(&message(0, vec![])));
        assert!(!always.field("count").unwrap().value().has_value());

        let mut never = expression("%0 > 2 AND count = 0", &["1"]);
        assert!(!never.evaluate(&message(0, vec![])));
    }

    #[test]
    fn test_mixed_numeric_kinds() {
        let mut filter = expression("ratio < count AND count >= -2", &[]);
        let mut sample = message(-1, vec![]);
        sample.set("ratio", -1.5).unwrap();
        assert!(filter.evaluate(&sample));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let mut filter = expression("name LIKE 'a%' AND values[0] BETWEEN 1 AND 3", &[]);
        let sample = message(0, vec![2]);
        assert!(filter.evaluate(&sample));
        assert!(filter.evaluate(&sample));
        assert!(!filter.evaluate(&message(0, vec![4])));
        assert!(filter.evaluate(&sample));
    }
}
