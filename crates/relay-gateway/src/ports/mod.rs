//! Ports (collaborator interfaces) for the relay.

pub mod outbound;

pub use outbound::{QueryExecutor, SystemTimeSource, TimeSource};
