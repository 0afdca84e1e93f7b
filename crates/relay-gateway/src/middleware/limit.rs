//! Request size limit middleware.
//!
//! Rejects requests whose declared `Content-Length` exceeds the limit before
//! any body bytes are read. Bodies without a length header are bounded again
//! when the endpoint reads them.

use crate::domain::error::AgentError;
use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

/// Body size limit layer
#[derive(Clone, Copy)]
pub struct BodyLimitLayer {
    max_request_size: usize,
}

impl BodyLimitLayer {
    pub fn new(max_request_size: usize) -> Self {
        Self { max_request_size }
    }
}

impl<S> Layer<S> for BodyLimitLayer {
    type Service = BodyLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BodyLimitService {
            inner,
            max_request_size: self.max_request_size,
        }
    }
}

/// Body size limit service
#[derive(Clone)]
pub struct BodyLimitService<S> {
    inner: S,
    max_request_size: usize,
}

impl<S> Service<Request<Body>> for BodyLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let max = self.max_request_size;

        if let Some(len) = declared_length(&req) {
            if len > max {
                warn!(size = len, max, "Request too large (from header)");
                return Box::pin(async move {
                    Ok(AgentError::payload_too_large(max).into_response())
                });
            }
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

fn declared_length<B>(req: &Request<B>) -> Option<usize> {
    req.headers()
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
