//! Log enrichment and tracing setup.
//!
//! The filters read the identifier store at emission time.
//! [`CorrelationFormat`] prefixes every text line with their values and
//! [`JsonCorrelationFormat`] adds them to JSON events under their names.

pub mod filter;
pub mod format;
pub mod spans;
pub mod tracing_setup;

pub use filter::{
    CORRELATION_ID_FIELD, CURRENT_ID_FIELD, CorrelationIdFilter, EnrichedFields, LogFilter,
    PARENT_ID_FIELD, TaskLineageFilter,
};
pub use format::{CorrelationFormat, JsonCorrelationFormat, render_prefix};
