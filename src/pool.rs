//! Recycling of expressions between builds.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::expression::FilterExpression;

/// Keeps up to `capacity` released expressions, cleared to the unbound
/// state, for the next build to reuse.
#[derive(Debug)]
pub struct ExpressionPool {
    capacity: usize,
    idle: Mutex<Vec<FilterExpression>>,
}

impl ExpressionPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            idle: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// An unbound expression, recycled when one is available.
    pub fn acquire(&self) -> FilterExpression {
        self.idle().pop().unwrap_or_default()
    }

    pub fn release(&self, mut expression: FilterExpression) {
        expression.clear();
        let mut idle = self.idle();
        if idle.len() < self.capacity {
            idle.push(expression);
            trace!("pooled expression, {} idle", idle.len());
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle().len()
    }

    fn idle(&self) -> MutexGuard<'_, Vec<FilterExpression>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapter::{MemberDescriptor, MessageType, PrimitiveKind};

    fn bound() -> FilterExpression {
        let message_type = Arc::new(MessageType::new(
            "Sample",
            vec![MemberDescriptor::new("count", PrimitiveKind::Int32)],
        ));
        FilterExpression::build("count = %0", &message_type, &["1"]).unwrap()
    }

    #[test]
    fn test_released_expressions_are_cleared() {
        let pool = ExpressionPool::new(2);
        pool.release(bound());
        assert_eq!(pool.idle_count(), 1);

        let expression = pool.acquire();
        assert!(!expression.is_bound());
        assert_eq!(expression.field_count(), 0);
        assert!(expression.parameters().is_empty());
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn test_capacity_is_respected() {
        let pool = ExpressionPool::new(1);
        pool.release(bound());
        pool.release(bound());
        assert_eq!(pool.idle_count(), 1);

        let empty = ExpressionPool::new(0);
        empty.release(bound());
        assert_eq!(empty.idle_count(), 0);
        assert!(!empty.acquire().is_bound());
    }
}
