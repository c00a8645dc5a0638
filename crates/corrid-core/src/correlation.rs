//! Correlation ID propagation for async request and task flows.
//!
//! The id lives in a tokio task-local, so every request or task sees only
//! the value bound by its own scope. The binding ends when the scoped future
//! completes, fails, panics or is dropped.

use crate::ids::CorrelationId;

pub use crate::generator::generate as generate_correlation_id;

tokio::task_local! {
    static CORRELATION_ID: CorrelationId;
}

pub fn current_correlation_id() -> Option<CorrelationId> {
    CORRELATION_ID.try_with(|id| id.clone()).ok()
}

pub fn current_or_new() -> CorrelationId {
    current_correlation_id().unwrap_or_else(generate_correlation_id)
}

pub async fn with_correlation_id<F, T>(id: CorrelationId, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    CORRELATION_ID.scope(id, fut).await
}

/// Bind `id` for the duration of a synchronous closure.
pub fn sync_with_correlation_id<F, T>(id: CorrelationId, f: F) -> T
where
    F: FnOnce() -> T,
{
    CORRELATION_ID.sync_scope(id, f)
}
