//! Process-wide correlation configuration.
//!
//! Built once at startup, validated, then shared by reference with the HTTP
//! layer, the log filters and the task interceptors.

use crate::error::{CorrelationError, Result};
use http::HeaderName;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HEADER_NAME: &str = "X-Request-ID";
pub const DEFAULT_PARENT_HEADER_NAME: &str = "X-Parent-Task-ID";
pub const DEFAULT_DISPLAY_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Header read from inbound requests and used as the task metadata key
    pub header_name: String,

    /// Header written to responses (None = same as `header_name`)
    pub response_header_name: Option<String>,

    /// Require inbound ids to parse as a UUID
    pub validate_header_as_uuid: bool,

    /// Emit a warning naming the rejected value when validation fails
    pub log_invalid_header: bool,

    /// Width of the placeholder, and truncation width for displayed ids
    pub display_length: usize,

    /// Placeholder used instead of a run of `-` when no id is bound
    pub default_value: Option<String>,

    /// Task metadata key carrying the dispatcher's current task id
    pub parent_header_name: String,

    /// Use the task message id as the lineage current id
    pub use_task_id_as_current: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_HEADER_NAME.to_string(),
            response_header_name: None,
            validate_header_as_uuid: true,
            log_invalid_header: true,
            display_length: DEFAULT_DISPLAY_LENGTH,
            default_value: None,
            parent_header_name: DEFAULT_PARENT_HEADER_NAME.to_string(),
            use_task_id_as_current: false,
        }
    }
}

impl CorrelationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn with_response_header_name(mut self, name: impl Into<String>) -> Self {
        self.response_header_name = Some(name.into());
        self
    }

    pub fn with_uuid_validation(mut self, enforce: bool) -> Self {
        self.validate_header_as_uuid = enforce;
        self
    }

    pub fn with_invalid_header_logging(mut self, enabled: bool) -> Self {
        self.log_invalid_header = enabled;
        self
    }

    pub fn with_display_length(mut self, length: usize) -> Self {
        self.display_length = length;
        self
    }

    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_parent_header_name(mut self, name: impl Into<String>) -> Self {
        self.parent_header_name = name.into();
        self
    }

    pub fn with_task_id_as_current(mut self, enabled: bool) -> Self {
        self.use_task_id_as_current = enabled;
        self
    }

    pub fn response_header(&self) -> &str {
        self.response_header_name
            .as_deref()
            .unwrap_or(&self.header_name)
    }

    /// Text shown in place of a missing id.
    pub fn placeholder(&self) -> String {
        self.default_value
            .clone()
            .unwrap_or_else(|| "-".repeat(self.display_length))
    }

    pub fn validate(&self) -> Result<()> {
        parse_header_name(&self.header_name)?;
        parse_header_name(self.response_header())?;
        parse_header_name(&self.parent_header_name)?;
        if self.display_length == 0 {
            return Err(CorrelationError::InvalidConfig(
                "display_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn parse_header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| CorrelationError::InvalidHeaderName(name.to_string()))
}
