//! Relay service - HTTPS server hosting `/query` and `/health`.

use crate::domain::config::AgentConfig;
use crate::domain::error::GatewayError;
use crate::envelope::build_codec;
use crate::middleware::{BodyLimitLayer, TracingLayer};
use crate::ports::{QueryExecutor, SystemTimeSource, TimeSource};
use crate::relay::RelayEndpoint;
use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tracing::info;

/// Relay service state
pub struct RelayService {
    config: AgentConfig,
    endpoint: Arc<RelayEndpoint>,
    handle: Handle,
}

impl RelayService {
    /// Create a service using the system clock.
    pub fn new(config: AgentConfig, executor: Arc<dyn QueryExecutor>) -> Result<Self, GatewayError> {
        Self::with_clock(config, executor, Arc::new(SystemTimeSource))
    }

    /// Create a service with an explicit time source for envelope expiry.
    pub fn with_clock(
        config: AgentConfig,
        executor: Arc<dyn QueryExecutor>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let codec = build_codec(&config.envelope, clock)?;
        let endpoint = Arc::new(RelayEndpoint::new(
            codec,
            executor,
            config.limits.max_request_size,
        ));

        Ok(Self {
            config,
            endpoint,
            handle: Handle::new(),
        })
    }

    /// HTTP router with the full middleware stack
    pub fn router(&self) -> Router {
        let state = AppState {
            endpoint: Arc::clone(&self.endpoint),
        };

        let middleware = ServiceBuilder::new()
            .layer(TracingLayer::new())
            .layer(BodyLimitLayer::new(self.config.limits.max_request_size));

        Router::new()
            .route("/query", post(handle_query))
            .route("/health", get(health_check))
            .layer(middleware)
            .with_state(state)
    }

    /// Serve over TLS until [`RelayService::shutdown`] is called.
    ///
    /// Unreadable certificate or key files fail before the socket is bound.
    pub async fn serve(&self) -> Result<(), GatewayError> {
        let tls = &self.config.tls;
        let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
            .await
            .map_err(|e| {
                GatewayError::Tls(format!(
                    "failed to load {} / {}: {}",
                    tls.cert_path.display(),
                    tls.key_path.display(),
                    e
                ))
            })?;

        let addr = self.config.listen_addr();
        info!(
            addr = %addr,
            scheme = ?self.config.envelope.scheme,
            debug = self.config.debug,
            "Starting relay server"
        );

        axum_server::bind_rustls(addr, rustls)
            .handle(self.handle.clone())
            .serve(self.router().into_make_service())
            .await
            .map_err(|e| GatewayError::Server(e.to_string()))?;

        info!("Relay server stopped");
        Ok(())
    }

    /// Trigger graceful shutdown, letting in-flight requests finish within `grace`.
    pub fn shutdown(&self, grace: Duration) {
        info!(grace_ms = grace.as_millis() as u64, "Shutting down relay server");
        self.handle.graceful_shutdown(Some(grace));
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    endpoint: Arc<RelayEndpoint>,
}

async fn handle_query(State(state): State<AppState>, body: Body) -> Response {
    match state.endpoint.handle(body).await {
        Ok(encoded) => (StatusCode::OK, Json(encoded)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "relay-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
