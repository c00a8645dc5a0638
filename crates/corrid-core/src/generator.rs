//! Identifier generation, validation and transformation.
//!
//! Each step is a trait with a blanket impl for plain closures, so callers
//! can pass `|| "fixed".to_string()` wherever a generator is expected.

use crate::error::{CorrelationError, Result};
use crate::ids::CorrelationId;
use uuid::Uuid;

/// Produces fresh identifiers.
pub trait IdGenerator: Send + Sync + 'static {
    fn generate(&self) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync + 'static,
{
    fn generate(&self) -> String {
        self()
    }
}

/// 32 lowercase hex characters taken from a random v4 UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidHexGenerator;

impl IdGenerator for UuidHexGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Decides whether an externally supplied identifier may be used as-is.
pub trait IdValidator: Send + Sync + 'static {
    fn is_valid(&self, raw: &str) -> bool;
}

impl<F> IdValidator for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn is_valid(&self, raw: &str) -> bool {
        self(raw)
    }
}

/// Accepts anything `uuid` can parse (hyphenated, simple, braced or URN).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidValidator;

impl IdValidator for UuidValidator {
    fn is_valid(&self, raw: &str) -> bool {
        is_valid_uuid(raw)
    }
}

/// Accepts every non-empty value.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAny;

impl IdValidator for AcceptAny {
    fn is_valid(&self, _raw: &str) -> bool {
        true
    }
}

/// Rewrites an identifier right before it is bound.
pub trait IdTransformer: Send + Sync + 'static {
    fn transform(&self, id: String) -> String;
}

impl<F> IdTransformer for F
where
    F: Fn(String) -> String + Send + Sync + 'static,
{
    fn transform(&self, id: String) -> String {
        self(id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl IdTransformer for Identity {
    fn transform(&self, id: String) -> String {
        id
    }
}

pub fn is_valid_uuid(raw: &str) -> bool {
    Uuid::parse_str(raw).is_ok()
}

pub fn generate() -> CorrelationId {
    CorrelationId::new(UuidHexGenerator.generate())
}

/// Validate an inbound identifier.
///
/// The value is trimmed first; an empty result is [`CorrelationError::Empty`]
/// so callers can treat it exactly like a missing header.
pub fn validate(raw: &str, enforce_uuid: bool) -> Result<CorrelationId> {
    if enforce_uuid {
        validate_with(raw, &UuidValidator)
    } else {
        validate_with(raw, &AcceptAny)
    }
}

pub fn validate_with(raw: &str, validator: &dyn IdValidator) -> Result<CorrelationId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CorrelationError::Empty);
    }
    if !validator.is_valid(trimmed) {
        return Err(CorrelationError::Rejected(trimmed.to_string()));
    }
    Ok(CorrelationId::from(trimmed))
}
