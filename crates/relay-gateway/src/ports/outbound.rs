//! Outbound ports for the relay.

use crate::domain::error::AgentError;
use crate::domain::request::{QueryResult, Request};
use async_trait::async_trait;

/// Execution collaborator.
///
/// Implementations must be safe to call concurrently for distinct requests
/// and must classify every failure as an [`AgentError`]. The request is
/// borrowed for the duration of the call only.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<QueryResult, AgentError>;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Seconds since the Unix epoch
    fn now(&self) -> u64;
}

/// System time implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
