//! Correlation-ID propagation for HTTP services and background tasks.
//!
//! Every inbound request gets an identifier (read from a header or
//! generated), bound for the lifetime of that request only. Log lines emitted
//! while it is bound are prefixed with it, and tasks dispatched from the
//! request carry it to workers together with a current/parent task lineage.
//!
//! This crate re-exports the workspace crates:
//! - [`core`]: identifier store, generation and validation, configuration
//! - [`http`]: tower layer and axum extractor
//! - [`interceptor`]: dispatch and task start hooks
//! - [`tasks`]: task client, transport and worker
//! - [`observability`]: log enrichment and tracing setup

pub use corrid_core as core;
pub use corrid_http as http;
pub use corrid_interceptor as interceptor;
pub use corrid_observability as observability;
pub use corrid_tasks as tasks;

pub use corrid_core::correlation::{current_correlation_id, with_correlation_id};
pub use corrid_core::lineage::{current_lineage, parent_task_id};
pub use corrid_core::{
    CorrelationConfig, CorrelationContext, CorrelationError, CorrelationId, Result,
    TaskEnvelope, TaskExecutionId, TaskLineage,
};
pub use corrid_http::{CorrelationIdLayer, RequestCorrelationId};
pub use corrid_interceptor::InterceptorRegistry;
pub use corrid_observability::tracing_setup::{init_json_tracing, init_tracing};
pub use corrid_observability::{CorrelationFormat, JsonCorrelationFormat};
pub use corrid_tasks::{InMemoryTransport, TaskClient, Worker, handler_fn};
