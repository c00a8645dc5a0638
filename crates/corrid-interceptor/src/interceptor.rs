//! Interceptor traits, pipelines and the registry that drives them.

use crate::interceptors::{CorrelationIdInterceptor, TaskLineageInterceptor, TracingTaskInterceptor};
use corrid_core::{CorrelationConfig, CorrelationContext, Result, TaskEnvelope};
use serde_json::Value;
use std::sync::Arc;

/// Runs in the dispatching process before a task is handed to the transport.
pub trait DispatchInterceptor: Send + Sync + 'static {
    /// Inspect or extend the outgoing envelope (typically its headers).
    fn before_dispatch(&self, task: &mut TaskEnvelope) -> Result<()>;
}

/// Runs in the worker process around a task body.
pub trait TaskStartInterceptor: Send + Sync + 'static {
    /// Called before the task body runs.
    ///
    /// # Arguments
    /// * `task` - The received envelope
    /// * `context` - Bindings the task body will run under
    fn on_task_start(&self, task: &TaskEnvelope, context: &mut CorrelationContext) -> Result<()>;

    /// Called inside the task's bindings, right before the task body.
    fn on_task_run(&self, _task: &TaskEnvelope) {}

    /// Called after the task body finishes, still inside the task's bindings.
    fn on_task_complete(&self, _task: &TaskEnvelope, _result: &Result<Value>) {}
}

/// Ordered list of interceptors of one kind.
pub struct InterceptorPipeline<I: ?Sized> {
    pub(crate) interceptors: Vec<Arc<I>>,
}

impl<I: ?Sized> InterceptorPipeline<I> {
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    /// Interceptors are executed in the order they are added.
    pub fn with_interceptor(mut self, interceptor: Arc<I>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn interceptors(&self) -> &[Arc<I>] {
        &self.interceptors
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl<I: ?Sized> Default for InterceptorPipeline<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatch and start pipelines, shared by a task client and its workers.
#[derive(Default)]
pub struct InterceptorRegistry {
    pub(crate) dispatch_pipeline: InterceptorPipeline<dyn DispatchInterceptor>,
    pub(crate) start_pipeline: InterceptorPipeline<dyn TaskStartInterceptor>,
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry carrying correlation id and lineage propagation plus tracing.
    pub fn with_correlation(config: &CorrelationConfig) -> Self {
        let mut registry = Self::new();
        registry.register(CorrelationIdInterceptor::from_config(config));
        registry.register(TaskLineageInterceptor::from_config(config));
        registry.register(TracingTaskInterceptor::new());
        registry
    }

    pub fn register_dispatch_interceptor<I: DispatchInterceptor>(&mut self, interceptor: I) {
        let pipeline = std::mem::take(&mut self.dispatch_pipeline);
        self.dispatch_pipeline =
            pipeline.with_interceptor(Arc::new(interceptor) as Arc<dyn DispatchInterceptor>);
    }

    pub fn register_start_interceptor<I: TaskStartInterceptor>(&mut self, interceptor: I) {
        let pipeline = std::mem::take(&mut self.start_pipeline);
        self.start_pipeline =
            pipeline.with_interceptor(Arc::new(interceptor) as Arc<dyn TaskStartInterceptor>);
    }

    /// Register one interceptor on both boundaries.
    pub fn register<I>(&mut self, interceptor: I)
    where
        I: DispatchInterceptor + TaskStartInterceptor,
    {
        let shared = Arc::new(interceptor);
        self.dispatch_pipeline
            .interceptors
            .push(shared.clone() as Arc<dyn DispatchInterceptor>);
        self.start_pipeline
            .interceptors
            .push(shared as Arc<dyn TaskStartInterceptor>);
    }

    /// Run every dispatch interceptor in order.
    ///
    /// A failing interceptor is logged and skipped; dispatch always proceeds.
    pub fn before_dispatch(&self, task: &mut TaskEnvelope) {
        for interceptor in self.dispatch_pipeline.interceptors() {
            if let Err(e) = interceptor.before_dispatch(task) {
                tracing::warn!(error = %e, task = %task.name, "dispatch interceptor failed");
            }
        }
    }

    /// Build the bindings a task body runs under.
    pub fn on_task_start(&self, task: &TaskEnvelope) -> CorrelationContext {
        let mut context = CorrelationContext::new();
        for interceptor in self.start_pipeline.interceptors() {
            if let Err(e) = interceptor.on_task_start(task, &mut context) {
                tracing::warn!(error = %e, task = %task.name, "task start interceptor failed");
            }
        }
        context
    }

    /// Must be called inside the context returned by [`Self::on_task_start`].
    pub fn notify_task_run(&self, task: &TaskEnvelope) {
        for interceptor in self.start_pipeline.interceptors() {
            interceptor.on_task_run(task);
        }
    }

    pub fn notify_task_complete(&self, task: &TaskEnvelope, result: &Result<Value>) {
        for interceptor in self.start_pipeline.interceptors() {
            interceptor.on_task_complete(task, result);
        }
    }

    pub fn dispatch_pipeline(&self) -> &InterceptorPipeline<dyn DispatchInterceptor> {
        &self.dispatch_pipeline
    }

    pub fn start_pipeline(&self) -> &InterceptorPipeline<dyn TaskStartInterceptor> {
        &self.start_pipeline
    }
}
