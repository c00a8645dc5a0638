//! Interceptors for the task dispatch and task start boundaries.
//!
//! Dispatch interceptors run in the sending process right before a task
//! envelope reaches the transport. Start interceptors run in the worker right
//! before the task body, and fill in the [`CorrelationContext`] the body is
//! executed under.
//!
//! [`CorrelationContext`]: corrid_core::CorrelationContext

pub mod interceptor;
pub mod interceptors;

pub use interceptor::{
    DispatchInterceptor, InterceptorPipeline, InterceptorRegistry, TaskStartInterceptor,
};
pub use interceptors::{CorrelationIdInterceptor, TaskLineageInterceptor, TracingTaskInterceptor};
