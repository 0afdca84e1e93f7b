// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Relay Gateway - secure single-endpoint query relay.
//!
//! Accepts a signed (or sealed) request envelope over TLS, verifies it,
//! validates the query inside, hands it to an execution collaborator and
//! returns the result wrapped in the same envelope scheme.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     RELAY GATEWAY                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │   POST /query {"encoded": "<token>"}        GET /health      │
//! │         │                                                    │
//! │  ┌──────┴───────────────────────────────┐                    │
//! │  │ Middleware: Tracing → BodyLimit      │                    │
//! │  └──────┬───────────────────────────────┘                    │
//! │         │                                                    │
//! │  ┌──────┴──────┐  ┌────────────┐  ┌────────────┐             │
//! │  │  Envelope   │→ │  Request   │→ │  Dispatch  │             │
//! │  │  decode     │  │  validate  │  │  boundary  │             │
//! │  └─────────────┘  └────────────┘  └─────┬──────┘             │
//! │         ▲                               │                    │
//! │         └──────── envelope encode ◄─────┘                    │
//! └─────────────────────────────────────────┼────────────────────┘
//!                                           ▼
//!                                 QueryExecutor (port)
//!                                 e.g. CommandExecutor
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use relay_gateway::{AgentConfig, CommandExecutor, RelayService};
//!
//! let config = AgentConfig::load("agent.toml")?;
//! let executor = Arc::new(CommandExecutor::new(&config.execution));
//! let service = RelayService::new(config, executor)?;
//! service.serve().await?;
//! ```
//!
//! # Security
//!
//! - Every envelope failure (tamper, expiry, wrong key, bad encoding) returns
//!   the same generic message
//! - Requests are validated field by field before reaching the collaborator
//! - Collaborator panics become a generic 500
//! - Commands run without a shell

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod dispatch;
pub mod domain;
pub mod envelope;
pub mod middleware;
pub mod ports;
pub mod relay;
pub mod service;

// Re-exports for public API
pub use adapters::CommandExecutor;
pub use dispatch::Dispatcher;
pub use domain::config::{AgentConfig, ConfigError, EnvelopeScheme};
pub use domain::error::{AgentError, AgentResult, ErrorBody, ErrorKind, GatewayError};
pub use domain::request::{QueryResult, QueryType, Request};
pub use domain::validation::{validate, FieldError, ValidationFailure};
pub use envelope::{build_codec, EnvelopeCodec, EnvelopeError};
pub use ports::{QueryExecutor, SystemTimeSource, TimeSource};
pub use relay::{EncodedBody, RelayEndpoint};
pub use service::RelayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
