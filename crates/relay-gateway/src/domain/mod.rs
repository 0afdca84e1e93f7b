//! Domain layer: request model, validation, error taxonomy, configuration.
//!
//! Pure types and functions. No I/O apart from reading the config file.

pub mod config;
pub mod correlation;
pub mod error;
pub mod request;
pub mod validation;

pub use config::{AgentConfig, ConfigError, EnvelopeConfig, EnvelopeScheme, Secret};
pub use correlation::CorrelationId;
pub use error::{AgentError, AgentResult, ErrorBody, ErrorKind, GatewayError};
pub use request::{QueryResult, QueryType, Request};
pub use validation::{validate, FieldError, ValidationFailure};
