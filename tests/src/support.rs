//! Shared fixtures for the relay test suite.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request as HttpRequest, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use relay_gateway::domain::config::Secret;
use relay_gateway::{
    build_codec, AgentConfig, AgentError, EnvelopeCodec, EnvelopeScheme, QueryExecutor,
    QueryResult, RelayService, Request, TimeSource,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Shared secret used by every fixture (32 bytes)
pub const SECRET: &str = "integration-secret-0123456789abc";

/// Fixed starting time for fixtures
pub const NOW: u64 = 1_700_000_000;

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn at(secs: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(secs)))
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Echoes the validated request back as the result, counting calls.
#[derive(Debug, Default)]
pub struct EchoExecutor {
    calls: AtomicUsize,
}

impl EchoExecutor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for EchoExecutor {
    async fn execute(&self, request: &Request) -> Result<QueryResult, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "query_type": request.query_type(),
            "vrf": request.vrf(),
            "target": request.target(),
            "source": request.source().map(|s| s.to_string()),
        }))
    }
}

/// Always fails with the given error
#[derive(Debug)]
pub struct FailingExecutor(pub AgentError);

#[async_trait]
impl QueryExecutor for FailingExecutor {
    async fn execute(&self, _request: &Request) -> Result<QueryResult, AgentError> {
        Err(self.0.clone())
    }
}

/// Config with the fixture secret and the given scheme
pub fn config(scheme: EnvelopeScheme) -> AgentConfig {
    let mut config = AgentConfig::default();
    config.envelope.scheme = scheme;
    config.envelope.secret = Some(Secret::new(SECRET));
    config
}

/// Server router plus a client codec sharing its key and clock
pub struct Harness {
    pub router: Router,
    pub client: Arc<dyn EnvelopeCodec>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(scheme: EnvelopeScheme, executor: Arc<dyn QueryExecutor>) -> Self {
        Self::with_config(config(scheme), executor)
    }

    pub fn with_config(config: AgentConfig, executor: Arc<dyn QueryExecutor>) -> Self {
        let clock = ManualClock::at(NOW);
        let client = build_codec(&config.envelope, clock.clone()).expect("client codec");
        let service =
            RelayService::with_clock(config, executor, clock.clone()).expect("relay service");

        Self {
            router: service.router(),
            client,
            clock,
        }
    }

    /// Encode `payload` as the client would
    pub fn token(&self, payload: &Value) -> String {
        self.client.encode(payload).expect("encode")
    }

    /// POST a raw body to `/query`
    pub async fn post_raw(&self, body: impl Into<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/query")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body.into())
                    .expect("request"),
            )
            .await
            .expect("infallible router");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// POST `{"encoded": token}` to `/query`
    pub async fn post_token(&self, token: &str) -> (StatusCode, Value) {
        self.post_raw(json!({ "encoded": token }).to_string()).await
    }

    /// Encode, POST, and decode a successful reply
    pub async fn query(&self, payload: &Value) -> (StatusCode, Value) {
        let (status, body) = self.post_token(&self.token(payload)).await;
        match body.get("encoded").and_then(Value::as_str) {
            Some(encoded) if status == StatusCode::OK => {
                (status, self.client.decode(encoded).expect("decode reply"))
            }
            _ => (status, body),
        }
    }
}

/// The error string of an error body
pub fn error_message(body: &Value) -> &str {
    body.get("error").and_then(Value::as_str).unwrap_or("")
}
