//! Parent/child task lineage.
//!
//! On dispatch the sender's current task id travels under the parent key;
//! on start the worker assigns a new current id and adopts that value as
//! its parent.

use crate::interceptor::{DispatchInterceptor, TaskStartInterceptor};
use corrid_core::config::DEFAULT_PARENT_HEADER_NAME;
use corrid_core::generator::{IdGenerator, UuidHexGenerator};
use corrid_core::lineage::current_task_id;
use corrid_core::{
    CorrelationConfig, CorrelationContext, Result, TaskEnvelope, TaskExecutionId, TaskLineage,
};
use std::sync::Arc;

pub struct TaskLineageInterceptor {
    parent_key: String,
    use_task_id: bool,
    generator: Arc<dyn IdGenerator>,
}

impl TaskLineageInterceptor {
    pub fn new(parent_key: impl Into<String>) -> Self {
        Self {
            parent_key: parent_key.into(),
            use_task_id: false,
            generator: Arc::new(UuidHexGenerator),
        }
    }

    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self::new(config.parent_header_name.clone())
            .with_task_id_as_current(config.use_task_id_as_current)
    }

    pub fn with_generator<G: IdGenerator>(mut self, generator: G) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    /// Use the task message id instead of a generated id as the current id.
    pub fn with_task_id_as_current(mut self, enabled: bool) -> Self {
        self.use_task_id = enabled;
        self
    }

    fn next_current_id(&self, task: &TaskEnvelope) -> TaskExecutionId {
        if self.use_task_id {
            TaskExecutionId::from(task.id.as_str())
        } else {
            TaskExecutionId::new(self.generator.generate())
        }
    }
}

impl Default for TaskLineageInterceptor {
    fn default() -> Self {
        Self::new(DEFAULT_PARENT_HEADER_NAME)
    }
}

impl DispatchInterceptor for TaskLineageInterceptor {
    fn before_dispatch(&self, task: &mut TaskEnvelope) -> Result<()> {
        if let Some(current) = current_task_id() {
            task.set_header(self.parent_key.clone(), current.into_string());
        }
        Ok(())
    }
}

impl TaskStartInterceptor for TaskLineageInterceptor {
    fn on_task_start(&self, task: &TaskEnvelope, context: &mut CorrelationContext) -> Result<()> {
        let parent_id = task
            .header(&self.parent_key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(TaskExecutionId::from);
        context.lineage = Some(TaskLineage::new(self.next_current_id(task), parent_id));
        Ok(())
    }
}
