//! Axum extractor for the request's correlation id.
//!
//! Reads the id stored in request extensions by [`CorrelationIdLayer`].
//! Rejects with 500 if the layer is not installed on the route.
//!
//! [`CorrelationIdLayer`]: crate::CorrelationIdLayer

use axum::{
    Json, async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use corrid_core::CorrelationId;
use corrid_core::correlation::current_correlation_id;

pub struct RequestCorrelationId(pub CorrelationId);

/// Returned when no correlation id was bound for the request.
#[derive(Debug)]
pub struct MissingCorrelationId;

impl IntoResponse for MissingCorrelationId {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "MISSING_CORRELATION_ID",
                "message": "CorrelationIdLayer is not installed for this route"
            })),
        )
            .into_response()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestCorrelationId {
    type Rejection = MissingCorrelationId;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CorrelationId>()
            .cloned()
            .or_else(current_correlation_id)
            .map(Self)
            .ok_or(MissingCorrelationId)
    }
}
