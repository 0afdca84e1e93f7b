//! Relay endpoint pipeline.
//!
//! One request moves strictly forward:
//!
//! ```text
//! Received → Decoded → Validated → Dispatched → Responded
//!     │          │          │           │
//!     └──────────┴──────────┴───────────┴──→ Errored
//! ```
//!
//! Every failure becomes an [`AgentError`]; nothing escapes the pipeline.

use crate::dispatch::Dispatcher;
use crate::domain::error::AgentError;
use crate::domain::validation::validate;
use crate::envelope::{into_structured, EnvelopeCodec};
use crate::ports::QueryExecutor;
use axum::body::{to_bytes, Body, Bytes};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Wire shape of both the request and the success response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBody {
    pub encoded: String,
}

/// The `/query` operation
#[derive(Clone)]
pub struct RelayEndpoint {
    codec: Arc<dyn EnvelopeCodec>,
    dispatcher: Dispatcher,
    max_request_size: usize,
}

impl RelayEndpoint {
    pub fn new(
        codec: Arc<dyn EnvelopeCodec>,
        executor: Arc<dyn QueryExecutor>,
        max_request_size: usize,
    ) -> Self {
        Self {
            codec,
            dispatcher: Dispatcher::new(executor),
            max_request_size,
        }
    }

    /// Read the body and run the pipeline, logging the outcome.
    pub async fn handle(&self, body: Body) -> Result<EncodedBody, AgentError> {
        let result = match self.read_body(body).await {
            Ok(raw) => self.relay(&raw).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => info!("Query relayed"),
            Err(e) if e.status().is_server_error() => {
                warn!(kind = ?e.kind, status = e.status().as_u16(), error = %e.message, "Query failed")
            }
            Err(e) => {
                info!(kind = ?e.kind, status = e.status().as_u16(), "Query rejected")
            }
        }

        result
    }

    /// Run the pipeline over an already-read body.
    pub async fn relay(&self, raw: &[u8]) -> Result<EncodedBody, AgentError> {
        let body: EncodedBody = serde_json::from_slice(raw).map_err(|e| {
            debug!(error = %e, "Unparsable request body");
            AgentError::malformed_body()
        })?;

        let decoded = self.codec.decode(&body.encoded)?;
        let payload = into_structured(decoded)?;
        debug!(payload = %payload, "Decoded query payload");

        let request = validate(&payload)?;
        let result = self.dispatcher.dispatch(&request).await?;

        let encoded = self.codec.encode(&result).map_err(|e| {
            error!(error = %e, "Failed to encode query result");
            AgentError::internal()
        })?;

        Ok(EncodedBody { encoded })
    }

    async fn read_body(&self, body: Body) -> Result<Bytes, AgentError> {
        to_bytes(body, self.max_request_size).await.map_err(|e| {
            warn!(error = %e, max = self.max_request_size, "Failed to read request body");
            AgentError::payload_too_large(self.max_request_size)
        })
    }
}
