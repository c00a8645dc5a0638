//! Log record filters that attach the bound identifiers as fields.
//!
//! Filters only read the store. A missing id becomes the configured
//! placeholder, so a text column keeps its width whether or not a request
//! or task is in scope.

use corrid_core::CorrelationConfig;
use corrid_core::correlation::current_correlation_id;
use corrid_core::lineage::current_lineage;

pub const CORRELATION_ID_FIELD: &str = "correlation_id";
pub const CURRENT_ID_FIELD: &str = "celery_current_id";
pub const PARENT_ID_FIELD: &str = "celery_parent_id";

/// Fields added to one log record, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedFields {
    fields: Vec<(&'static str, String)>,
}

impl EnrichedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an earlier value in place.
    pub fn insert(&mut self, name: &'static str, value: String) {
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(name, value)| (*name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub trait LogFilter: Send + Sync + 'static {
    fn enrich(&self, fields: &mut EnrichedFields);
}

#[derive(Debug, Clone)]
struct IdDisplay {
    length: usize,
    placeholder: String,
}

impl IdDisplay {
    fn from_config(config: &CorrelationConfig) -> Self {
        Self {
            length: config.display_length,
            placeholder: config.placeholder(),
        }
    }

    fn render(&self, value: Option<&str>) -> String {
        match value {
            Some(value) => value.chars().take(self.length).collect(),
            None => self.placeholder.clone(),
        }
    }
}

/// Adds `correlation_id`.
#[derive(Debug, Clone)]
pub struct CorrelationIdFilter {
    display: IdDisplay,
}

impl CorrelationIdFilter {
    pub fn new() -> Self {
        Self::from_config(&CorrelationConfig::default())
    }

    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self {
            display: IdDisplay::from_config(config),
        }
    }

    /// Value the filter would attach right now.
    pub fn value(&self) -> String {
        let id = current_correlation_id();
        self.display.render(id.as_ref().map(|id| id.as_str()))
    }
}

impl Default for CorrelationIdFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogFilter for CorrelationIdFilter {
    fn enrich(&self, fields: &mut EnrichedFields) {
        fields.insert(CORRELATION_ID_FIELD, self.value());
    }
}

/// Adds `celery_parent_id` and `celery_current_id`, each with its own
/// placeholder substitution.
#[derive(Debug, Clone)]
pub struct TaskLineageFilter {
    display: IdDisplay,
}

impl TaskLineageFilter {
    pub fn new() -> Self {
        Self::from_config(&CorrelationConfig::default())
    }

    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self {
            display: IdDisplay::from_config(config),
        }
    }
}

impl Default for TaskLineageFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogFilter for TaskLineageFilter {
    fn enrich(&self, fields: &mut EnrichedFields) {
        let lineage = current_lineage();
        let current = lineage.as_ref().map(|l| l.current_id.as_str());
        let parent = lineage
            .as_ref()
            .and_then(|l| l.parent_id.as_ref())
            .map(|id| id.as_str());
        fields.insert(PARENT_ID_FIELD, self.display.render(parent));
        fields.insert(CURRENT_ID_FIELD, self.display.render(current));
    }
}
