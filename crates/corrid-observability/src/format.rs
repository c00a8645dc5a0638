//! Event formatters carrying the enriched fields.
//!
//! [`CorrelationFormat`] prefixes text lines. With both built-in filters a
//! line reads `[correlation_id] [parent_id-current_id] <inner format>`.
//! [`JsonCorrelationFormat`] merges the fields, by name, into the JSON object
//! of each event.

use crate::filter::{
    CURRENT_ID_FIELD, CorrelationIdFilter, EnrichedFields, LogFilter, PARENT_ID_FIELD,
    TaskLineageFilter,
};
use corrid_core::CorrelationConfig;
use serde_json::Value;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{Format, Full, Json, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

#[derive(Clone, Default)]
struct Filters(Vec<Arc<dyn LogFilter>>);

impl Filters {
    fn from_config(config: &CorrelationConfig) -> Self {
        Self(vec![
            Arc::new(CorrelationIdFilter::from_config(config)),
            Arc::new(TaskLineageFilter::from_config(config)),
        ])
    }

    fn enrich(&self) -> EnrichedFields {
        let mut fields = EnrichedFields::new();
        for filter in &self.0 {
            filter.enrich(&mut fields);
        }
        fields
    }
}

/// Wraps an inner text [`FormatEvent`] and writes `[value] ` for every
/// enriched field, in filter order, before the inner output. A parent id
/// directly followed by a current id shares one bracket as `[parent-current]`.
#[derive(Clone)]
pub struct CorrelationFormat<F = Format<Full>> {
    inner: F,
    filters: Filters,
}

impl CorrelationFormat {
    /// Default text format with the correlation and lineage filters.
    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self {
            inner: tracing_subscriber::fmt::format(),
            filters: Filters::from_config(config),
        }
    }
}

impl<F> CorrelationFormat<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            filters: Filters::default(),
        }
    }

    pub fn with_filter<L: LogFilter>(mut self, filter: L) -> Self {
        self.filters.0.push(Arc::new(filter));
        self
    }

    pub fn enrich(&self) -> EnrichedFields {
        self.filters.enrich()
    }
}

/// Render the bracketed prefix for `fields`.
pub fn render_prefix(fields: &EnrichedFields) -> String {
    let mut prefix = String::new();
    let mut iter = fields.iter().peekable();
    while let Some((name, value)) = iter.next() {
        match iter.peek() {
            Some(&(next, current)) if name == PARENT_ID_FIELD && next == CURRENT_ID_FIELD => {
                let _ = write!(prefix, "[{}-{}] ", value, current);
                iter.next();
            }
            _ => {
                let _ = write!(prefix, "[{}] ", value);
            }
        }
    }
    prefix
}

impl<S, N, F> FormatEvent<S, N> for CorrelationFormat<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    F: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        writer.write_str(&render_prefix(&self.enrich()))?;
        self.inner.format_event(ctx, writer, event)
    }
}

/// Wraps a JSON [`FormatEvent`] and adds every enriched field as a
/// top-level key of the event object, e.g.
/// `{"correlation_id":"...","celery_parent_id":"...",...}`.
///
/// Pair it with `fmt().json()` so span fields are recorded as JSON too.
#[derive(Clone)]
pub struct JsonCorrelationFormat<F = Format<Json>> {
    inner: F,
    filters: Filters,
}

impl JsonCorrelationFormat {
    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self {
            inner: tracing_subscriber::fmt::format().json(),
            filters: Filters::from_config(config),
        }
    }
}

impl<F> JsonCorrelationFormat<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            filters: Filters::default(),
        }
    }

    pub fn with_filter<L: LogFilter>(mut self, filter: L) -> Self {
        self.filters.0.push(Arc::new(filter));
        self
    }
}

impl<S, N, F> FormatEvent<S, N> for JsonCorrelationFormat<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    F: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut line = String::new();
        self.inner.format_event(ctx, Writer::new(&mut line), event)?;

        let mut object: Value = serde_json::from_str(line.trim_end()).map_err(|_| fmt::Error)?;
        if let Some(map) = object.as_object_mut() {
            for (name, value) in self.filters.enrich().iter() {
                map.insert(name.to_string(), Value::String(value.to_string()));
            }
        }
        writeln!(writer, "{}", object)
    }
}
