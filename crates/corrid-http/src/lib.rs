//! Request interception for correlation ids.
//!
//! [`CorrelationIdLayer`] reads or generates the id for every request, binds
//! it for the duration of the inner service call and writes it back on the
//! response. [`RequestCorrelationId`] hands it to axum handlers.

pub mod extract;
pub mod layer;

pub use extract::{MissingCorrelationId, RequestCorrelationId};
pub use layer::{CorrelationIdLayer, CorrelationIdService};
