//! Carries the correlation id from the dispatching unit of work to the task.

use crate::interceptor::{DispatchInterceptor, TaskStartInterceptor};
use corrid_core::config::DEFAULT_HEADER_NAME;
use corrid_core::correlation::current_correlation_id;
use corrid_core::generator::{IdGenerator, UuidHexGenerator};
use corrid_core::{CorrelationConfig, CorrelationContext, CorrelationId, Result, TaskEnvelope};
use std::sync::Arc;

pub struct CorrelationIdInterceptor {
    header_key: String,
    generator: Arc<dyn IdGenerator>,
}

impl CorrelationIdInterceptor {
    pub fn new(header_key: impl Into<String>) -> Self {
        Self {
            header_key: header_key.into(),
            generator: Arc::new(UuidHexGenerator),
        }
    }

    /// Uses the same key as the HTTP layer's inbound header.
    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self::new(config.header_name.clone())
    }

    pub fn with_generator<G: IdGenerator>(mut self, generator: G) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    pub fn header_key(&self) -> &str {
        &self.header_key
    }
}

impl Default for CorrelationIdInterceptor {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_NAME)
    }
}

impl DispatchInterceptor for CorrelationIdInterceptor {
    fn before_dispatch(&self, task: &mut TaskEnvelope) -> Result<()> {
        match current_correlation_id() {
            Some(id) => task.set_header(self.header_key.clone(), id.into_string()),
            // Dispatched outside any request: start a new chain unless the
            // caller already put an id on the envelope.
            None if task.header(&self.header_key).is_none() => {
                task.set_header(self.header_key.clone(), self.generator.generate())
            }
            None => {}
        }
        Ok(())
    }
}

impl TaskStartInterceptor for CorrelationIdInterceptor {
    fn on_task_start(&self, task: &TaskEnvelope, context: &mut CorrelationContext) -> Result<()> {
        let id = match task
            .header(&self.header_key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            Some(value) => CorrelationId::from(value),
            None => {
                tracing::debug!(task = %task.name, "task carries no correlation id, generating one");
                CorrelationId::new(self.generator.generate())
            }
        };
        context.correlation_id = Some(id);
        Ok(())
    }
}
