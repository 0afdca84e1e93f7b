//! Dispatch boundary between the endpoint and the execution collaborator.

use crate::domain::error::AgentError;
use crate::domain::request::{QueryResult, Request};
use crate::ports::QueryExecutor;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

/// Hands validated requests to the collaborator.
///
/// Classified failures pass through untouched. A panic inside the
/// collaborator becomes [`AgentError::internal`]; its payload is logged and
/// never returned.
#[derive(Clone)]
pub struct Dispatcher {
    executor: Arc<dyn QueryExecutor>,
}

impl Dispatcher {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    pub async fn dispatch(&self, request: &Request) -> Result<QueryResult, AgentError> {
        debug!(
            query_type = %request.query_type(),
            target = request.target(),
            "Dispatching query"
        );

        match AssertUnwindSafe(self.executor.execute(request))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                error!(
                    query_type = %request.query_type(),
                    panic = panic_message(panic.as_ref()),
                    "Executor panicked"
                );
                Err(AgentError::internal())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
