//! Built-in interceptors
//!
//! Correlation id and lineage propagation, plus structured tracing events
//! at each task boundary.

pub mod correlation;
pub mod lineage;
pub mod tracing;

pub use correlation::CorrelationIdInterceptor;
pub use lineage::TaskLineageInterceptor;
pub use self::tracing::TracingTaskInterceptor;
