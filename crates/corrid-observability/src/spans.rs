//! Span helpers for request and task instrumentation.
//!
//! All span names use the `corrid.` prefix.

use tracing::Span;

/// Span around one inbound HTTP request.
#[inline]
pub fn http_request(method: &str, path: &str, correlation_id: &str) -> Span {
    tracing::info_span!(
        "corrid.http_request",
        method = method,
        path = path,
        correlation_id = correlation_id,
    )
}

/// Span around handing a task to the transport.
#[inline]
pub fn task_dispatch(task: &str, task_id: &str) -> Span {
    tracing::debug_span!("corrid.task_dispatch", task = task, task_id = task_id)
}

/// Span around one task execution on a worker.
#[inline]
pub fn task_execution(task: &str, task_id: &str) -> Span {
    tracing::info_span!("corrid.task_execution", task = task, task_id = task_id)
}
