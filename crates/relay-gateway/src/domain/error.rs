//! Relay error taxonomy.
//!
//! Every failure on the request path ends up as an [`AgentError`]: a kind
//! plus a client-safe message. [`ErrorKind::status`] is the single, total
//! mapping from kind to HTTP status.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-facing messages that must not vary with internal detail.
pub mod messages {
    /// Returned for every envelope failure: tamper, expiry, wrong key, bad encoding.
    pub const MALFORMED_ENVELOPE: &str = "malformed or untrusted envelope";
    /// Returned when the outer request body is not `{"encoded": "<string>"}`.
    pub const MALFORMED_BODY: &str =
        "request body must be a JSON object with an \"encoded\" string field";
    /// Returned for unclassified failures.
    pub const INTERNAL: &str = "internal error";
}

/// Error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Outer body is not JSON or lacks the `encoded` field
    MalformedBody,
    /// Outer body exceeds the configured size limit
    PayloadTooLarge,
    /// Token unparsable, unverifiable, expired, or not structured data
    MalformedEnvelope,
    /// Decoded payload failed schema constraints
    ValidationFailure,
    /// Execution collaborator ran out of time
    Timeout,
    /// Execution collaborator failed
    ExecutionFailed,
    /// Query type not supported by the collaborator
    Unsupported,
    /// Collaborator temporarily unavailable
    Unavailable,
    /// Collaborator-declared status code
    Custom(u16),
    /// Unclassified failure
    Internal,
}

impl ErrorKind {
    /// HTTP status for this kind.
    ///
    /// `Custom` codes outside 400..=599 collapse to 500.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::MalformedBody
            | ErrorKind::MalformedEnvelope
            | ErrorKind::ValidationFailure => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::ExecutionFailed | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Unsupported => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Custom(code) => match StatusCode::from_u16(*code) {
                Ok(status) if status.is_client_error() || status.is_server_error() => status,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Relay error with kind and client-safe message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentError {
    /// Classification
    pub kind: ErrorKind,
    /// Message returned to the caller
    pub message: String,
}

impl AgentError {
    /// Create a new error
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    // Pipeline errors

    pub fn malformed_body() -> Self {
        Self::new(ErrorKind::MalformedBody, messages::MALFORMED_BODY)
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            ErrorKind::PayloadTooLarge,
            format!("payload too large: limit is {} bytes", limit),
        )
    }

    /// Envelope failure. Deliberately takes no detail.
    pub fn malformed_envelope() -> Self {
        Self::new(ErrorKind::MalformedEnvelope, messages::MALFORMED_ENVELOPE)
    }

    pub fn validation(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailure, details)
    }

    /// Unclassified failure. Deliberately takes no detail.
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal, messages::INTERNAL)
    }

    // Collaborator errors

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("timed out: {}", operation.into()),
        )
    }

    pub fn execution_failed(details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::ExecutionFailed,
            format!("execution failed: {}", details.into()),
        )
    }

    pub fn unsupported(query_type: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::Unsupported,
            format!("query type not supported: {}", query_type),
        )
    }

    pub fn unavailable(details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Unavailable,
            format!("unavailable: {}", details.into()),
        )
    }

    /// Collaborator error with an explicit status code
    pub fn with_status(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Custom(code), message)
    }

    /// Response body for this error
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message.clone(),
        }
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status().as_u16(), self.message)
    }
}

impl std::error::Error for AgentError {}

/// Wire shape of every error response: `{"error": "<message>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Result type for the request path
pub type AgentResult<T> = Result<T, AgentError>;

/// Startup errors (not returned to clients)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Envelope key material missing or unusable
    #[error("key material error: {0}")]
    KeyMaterial(String),

    /// TLS certificate or key could not be loaded
    #[error("TLS error: {0}")]
    Tls(String),

    /// Server socket bind or serve error
    #[error("server error: {0}")]
    Server(String),
}
