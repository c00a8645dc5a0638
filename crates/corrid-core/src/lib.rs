//! Correlation-ID core types and shared utilities.
//!
//! Holds the task-local identifier store, identifier generation and
//! validation, configuration and the task envelope shared by the HTTP layer,
//! the interceptors and the worker runtime.

pub mod config;
pub mod context;
pub mod correlation;
pub mod error;
pub mod generator;
pub mod ids;
pub mod lineage;
pub mod types;

pub use config::CorrelationConfig;
pub use context::CorrelationContext;
pub use error::{CorrelationError, Result};
pub use ids::{CorrelationId, TaskExecutionId, TaskId};
pub use lineage::TaskLineage;
pub use types::{TaskEnvelope, TaskHeaders};
