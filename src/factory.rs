//! # Filter Factory
//!
//! Creates filters from text, updates them in place and recycles their
//! expressions. An empty (or all-whitespace) text creates the empty filter,
//! which accepts every message.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::adapter::{MessageType, MessageView};
use crate::binder::BindError;
use crate::config::FilterConfig;
use crate::error::FilterResult;
use crate::expression::FilterExpression;
use crate::parameter::Parameter;
use crate::pool::ExpressionPool;

/// Filter with no expression; accepts everything.
#[derive(Debug, Clone)]
pub struct EmptyFilter {
    message_type: Arc<MessageType>,
    parameters: Vec<String>,
}

#[derive(Debug)]
pub enum Filter {
    Empty(EmptyFilter),
    Expression(FilterExpression),
}

impl Filter {
    pub fn text(&self) -> &str {
        match self {
            Filter::Empty(_) => "",
            Filter::Expression(expression) => expression.text(),
        }
    }

    pub fn parameters(&self) -> Vec<String> {
        match self {
            Filter::Empty(empty) => empty.parameters.clone(),
            Filter::Expression(expression) => expression.parameters(),
        }
    }

    pub fn message_type(&self) -> Option<&Arc<MessageType>> {
        match self {
            Filter::Empty(empty) => Some(&empty.message_type),
            Filter::Expression(expression) => expression.message_type(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Filter::Empty(_))
    }

    pub fn evaluate(&mut self, message: &dyn MessageView) -> bool {
        match self {
            Filter::Empty(_) => true,
            Filter::Expression(expression) => expression.evaluate(message),
        }
    }

    fn is_bound_to(&self, message_type: &Arc<MessageType>) -> bool {
        self.message_type()
            .is_some_and(|bound| Arc::ptr_eq(bound, message_type) || bound == message_type)
    }
}

#[derive(Debug)]
pub struct FilterFactory {
    config: FilterConfig,
    pool: ExpressionPool,
}

impl Default for FilterFactory {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

impl FilterFactory {
    pub fn new(config: FilterConfig) -> Self {
        let pool = ExpressionPool::new(config.pool_capacity);
        Self { config, pool }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn pool(&self) -> &ExpressionPool {
        &self.pool
    }

    #[instrument(level = "debug", skip(self, message_type, parameters), fields(message_type = %message_type.name))]
    pub fn create<S: AsRef<str>>(
        &self,
        text: &str,
        message_type: &Arc<MessageType>,
        parameters: &[S],
    ) -> FilterResult<Filter> {
        self.check_parameter_count(parameters.len())?;

        if text.trim().is_empty() {
            let parameters = Parameter::parse_all(parameters)?
                .into_iter()
                .map(|(source, _)| source)
                .collect();
            debug!("created empty filter");
            return Ok(Filter::Empty(EmptyFilter {
                message_type: message_type.clone(),
                parameters,
            }));
        }

        let mut expression = self.pool.acquire();
        if let Err(e) = expression.bind(text, message_type, parameters) {
            warn!("rejected filter expression '{}': {}", text, e);
            self.pool.release(expression);
            return Err(e);
        }
        Ok(Filter::Expression(expression))
    }

    /// Updates a filter in place. Without new text, or with the text it
    /// already has, only the parameters are rebound; otherwise a new filter is
    /// built and swapped in. On error `filter` is left unchanged.
    #[instrument(level = "debug", skip(self, filter, message_type, parameters))]
    pub fn update<S: AsRef<str>>(
        &self,
        filter: &mut Filter,
        message_type: &Arc<MessageType>,
        text: Option<&str>,
        parameters: &[S],
    ) -> FilterResult<()> {
        self.check_parameter_count(parameters.len())?;

        let same_text = text.map_or(true, |text| text == filter.text());
        if same_text && filter.is_bound_to(message_type) {
            let result = match filter {
                Filter::Empty(empty) => Parameter::parse_all(parameters)
                    .map(|parsed| {
                        empty.parameters = parsed.into_iter().map(|(source, _)| source).collect();
                    })
                    .map_err(Into::into),
                Filter::Expression(expression) => expression.rebind_parameters(parameters),
            };
            if let Err(e) = &result {
                warn!("rejected parameters for '{}': {}", filter.text(), e);
            }
            return result;
        }

        let text = text.unwrap_or_else(|| filter.text()).to_string();
        let replacement = self.create(&text, message_type, parameters)?;
        let previous = std::mem::replace(filter, replacement);
        self.release(previous);
        Ok(())
    }

    /// Returns a filter's expression to the pool.
    pub fn release(&self, filter: Filter) {
        if let Filter::Expression(expression) = filter {
            self.pool.release(expression);
        }
    }

    fn check_parameter_count(&self, count: usize) -> Result<(), BindError> {
        if count > self.config.max_parameters {
            return Err(BindError::TooManyParameters {
                count,
                max: self.config.max_parameters,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{DynamicMessage, MemberDescriptor, PrimitiveKind};
    use crate::error::Error;

    fn sample_type() -> Arc<MessageType> {
        Arc::new(MessageType::new(
            "Sample",
            vec![
                MemberDescriptor::new("count", PrimitiveKind::Int32),
                MemberDescriptor::new("name", PrimitiveKind::String),
            ],
        ))
    }

    fn sample(count: i32) -> DynamicMessage {
        let mut message = DynamicMessage::new(sample_type());
        message.set("count", count).unwrap();
        message
    }

    #[test]
    fn test_empty_text_accepts_everything() {
        let factory = FilterFactory::default();
        let mut filter = factory.create("  ", &sample_type(), &["1", "'x'"]).unwrap();
        assert!(filter.is_empty());
        assert!(filter.evaluate(&sample(0)));
        assert_eq!(filter.parameters(), vec!["1", "'x'"]);

        assert!(factory.create("", &sample_type(), &["bad"]).is_err());
    }

    #[test]
    fn test_too_many_parameters() {
        let factory = FilterFactory::new(FilterConfig {
            max_parameters: 1,
            ..FilterConfig::default()
        });
        assert!(matches!(
            factory.create("count = %0", &sample_type(), &["1", "2"]),
            Err(Error::Bind(BindError::TooManyParameters { count: 2, max: 1 }))
        ));
    }

    #[test]
    fn test_failed_create_returns_expression_to_pool() {
        let factory = FilterFactory::default();
        assert!(factory.create("count = 'x'", &sample_type(), &[] as &[&str]).is_err());
        assert_eq!(factory.pool().idle_count(), 1);
    }

    #[test]
    fn test_update_parameters_keeps_tree() {
        let factory = FilterFactory::default();
        let message_type = sample_type();
        let mut filter = factory.create("count = %0", &message_type, &["1"]).unwrap();
        factory
            .update(&mut filter, &message_type, None, &["2"])
            .unwrap();
        assert_eq!(filter.parameters(), vec!["2"]);
        assert!(filter.evaluate(&sample(2)));
        assert!(!filter.evaluate(&sample(1)));
        assert_eq!(factory.pool().idle_count(), 0);
    }

    #[test]
    fn test_update_text_swaps_and_recycles() {
        let factory = FilterFactory::default();
        let message_type = sample_type();
        let mut filter = factory.create("count = 1", &message_type, &[] as &[&str]).unwrap();
        factory
            .update(&mut filter, &message_type, Some("name = 'abc'"), &[] as &[&str])
            .unwrap();
        assert_eq!(filter.text(), "name = 'abc'");
        assert_eq!(factory.pool().idle_count(), 1);
    }

    #[test]
    fn test_failed_update_keeps_filter() {
        let factory = FilterFactory::default();
        let message_type = sample_type();
        let mut filter = factory.create("count = %0", &message_type, &["1"]).unwrap();

        assert!(factory
            .update(&mut filter, &message_type, Some("missing = 1"), &[] as &[&str])
            .is_err());
        assert!(factory
            .update(&mut filter, &message_type, None, &["'text'"])
            .is_err());

        assert_eq!(filter.text(), "count = %0");
        assert_eq!(filter.parameters(), vec!["1"]);
        assert!(filter.evaluate(&sample(1)));
    }

    #[test]
    fn test_update_to_another_type_rebuilds() {
        let factory = FilterFactory::default();
        let mut filter = factory.create("count = %0", &sample_type(), &["1"]).unwrap();
        let other = Arc::new(MessageType::new(
            "Other",
            vec![MemberDescriptor::new("count", PrimitiveKind::Uint8)],
        ));
        factory.update(&mut filter, &other, None, &["3"]).unwrap();
        assert!(Arc::ptr_eq(filter.message_type().unwrap(), &other));
        assert_eq!(filter.parameters(), vec!["3"]);
    }
}
