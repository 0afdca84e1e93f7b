//! Middleware stack for the relay.
//!
//! Layer order: Request → Tracing → BodyLimit → Handler

pub mod limit;
pub mod tracing;

pub use limit::BodyLimitLayer;
pub use tracing::TracingLayer;
