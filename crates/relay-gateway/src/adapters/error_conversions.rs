//! Error conversions into the relay taxonomy and onto the wire.
//!
//! These involve HTTP response types and belong in the adapters layer.

use crate::domain::error::AgentError;
use crate::domain::validation::ValidationFailure;
use crate::envelope::EnvelopeError;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

impl From<ValidationFailure> for AgentError {
    fn from(failure: ValidationFailure) -> Self {
        AgentError::validation(failure.to_string())
    }
}

/// Every envelope sub-case collapses to the same client error.
impl From<EnvelopeError> for AgentError {
    fn from(e: EnvelopeError) -> Self {
        debug!(reason = %e, "Envelope rejected");
        AgentError::malformed_envelope()
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}
