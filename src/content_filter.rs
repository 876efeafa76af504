//! # Content Filter
//!
//! A thread-safe handle holding at most one filter. Every operation takes the
//! handle's lock, so creation, updates, evaluation and teardown on one handle
//! are serialized; separate handles never contend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::adapter::{MessageType, MessageView};
use crate::error::{Error, FilterResult};
use crate::factory::{Filter, FilterFactory};

#[derive(Debug)]
pub struct ContentFilter {
    factory: Arc<FilterFactory>,
    slot: Mutex<Option<Filter>>,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(Arc::new(FilterFactory::default()))
    }
}

impl ContentFilter {
    pub fn new(factory: Arc<FilterFactory>) -> Self {
        Self {
            factory,
            slot: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.slot().is_some()
    }

    /// Installs or replaces the filter. A failed update keeps the previous
    /// filter in effect.
    pub fn set<S: AsRef<str>>(
        &self,
        message_type: &Arc<MessageType>,
        text: &str,
        parameters: &[S],
    ) -> FilterResult<()> {
        let mut slot = self.slot();
        match slot.as_mut() {
            Some(filter) => self
                .factory
                .update(filter, message_type, Some(text), parameters)?,
            None => *slot = Some(self.factory.create(text, message_type, parameters)?),
        }
        debug!("content filter set to '{}'", text);
        Ok(())
    }

    /// Rebinds only the parameters of the installed filter.
    pub fn set_parameters<S: AsRef<str>>(&self, parameters: &[S]) -> FilterResult<()> {
        let mut slot = self.slot();
        let filter = slot.as_mut().ok_or(Error::NotConfigured)?;
        let message_type = filter
            .message_type()
            .cloned()
            .ok_or(Error::NotConfigured)?;
        self.factory
            .update(filter, &message_type, None, parameters)
    }

    /// Text and parameters of the installed filter.
    pub fn get(&self) -> FilterResult<(String, Vec<String>)> {
        let slot = self.slot();
        let filter = slot.as_ref().ok_or(Error::NotConfigured)?;
        Ok((filter.text().to_string(), filter.parameters()))
    }

    /// Whether `message` passes. Everything passes while no filter is set.
    pub fn evaluate(&self, message: &dyn MessageView) -> bool {
        match self.slot().as_mut() {
            Some(filter) => filter.evaluate(message),
            None => true,
        }
    }

    pub fn clear(&self) {
        if let Some(filter) = self.slot().take() {
            self.factory.release(filter);
            debug!("content filter cleared");
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Filter>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ContentFilter {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{MemberDescriptor, PrimitiveKind};
    use serde_json::json;

    fn sample_type() -> Arc<MessageType> {
        Arc::new(MessageType::new(
            "Sample",
            vec![MemberDescriptor::new("count", PrimitiveKind::Int64)],
        ))
    }

    #[test]
    fn test_disabled_filter_accepts() {
        let filter = ContentFilter::default();
        assert!(!filter.is_enabled());
        assert!(filter.evaluate(&json!({ "count": 1 })));
        assert!(matches!(filter.get(), Err(Error::NotConfigured)));
        assert!(matches!(
            filter.set_parameters(&["1"]),
            Err(Error::NotConfigured)
        ));
    }

    #[test]
    fn test_set_get_clear() {
        let filter = ContentFilter::default();
        filter.set(&sample_type(), "count > %0", &["10"]).unwrap();
        assert!(filter.is_enabled());
        assert_eq!(
            filter.get().unwrap(),
            ("count > %0".to_string(), vec!["10".to_string()])
        );
        assert!(filter.evaluate(&json!({ "count": 11 })));
        assert!(!filter.evaluate(&json!({ "count": 10 })));

        filter.set_parameters(&["-1"]).unwrap();
        assert!(filter.evaluate(&json!({ "count": 0 })));

        filter.clear();
        assert!(!filter.is_enabled());
        assert!(filter.evaluate(&json!({ "count": 0 })));
    }

    #[test]
    fn test_drop_returns_expression_to_pool() {
        let factory = Arc::new(FilterFactory::default());
        {
            let filter = ContentFilter::new(factory.clone());
            filter.set(&sample_type(), "count = 1", &[] as &[&str]).unwrap();
        }
        assert_eq!(factory.pool().idle_count(), 1);
    }
}
