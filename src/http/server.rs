//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout)
//! - Bind server to listener
//! - Run the health sweeper alongside request handling
//! - Drain on shutdown

use axum::{
    body::Body,
    http::{HeaderName, Request},
    routing::{any, get},
    Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::GatewayConfig;
use crate::error::PersistenceError;
use crate::http::proxy::proxy_handler;
use crate::http::status::aggregate_health;
use crate::state::GatewayState;

pub const X_REQUEST_ID: &str = "x-request-id";

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    state: GatewayState,
}

impl GatewayServer {
    /// Load persisted state and build the router.
    pub async fn bootstrap(config: GatewayConfig) -> Result<Self, PersistenceError> {
        let state = GatewayState::bootstrap(config).await?;
        Ok(Self::new(state))
    }

    pub fn new(state: GatewayState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: GatewayState) -> Router {
        let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/health", get(aggregate_health))
            .route("/api/{service}", any(proxy_handler))
            .route("/api/{service}/{*rest}", any(proxy_handler))
            .merge(admin::router(state.clone()))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// Shared state, e.g. for registering instances before serving.
    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// Router with state applied; handy for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on the given listener until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = self.state.health_sweeper();
        let sweeper_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            sweeper.run(sweeper_shutdown).await;
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
