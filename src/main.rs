//! API Gateway
//!
//! Proxies `/api/{service}/...` to backend instances found in a persisted
//! service registry, behind one circuit breaker per known service.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                   API GATEWAY                    │
//!   Client Request   │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ─────────────────┼─▶│  http   │──▶│ breaker  │──▶│   registry   │   │
//!                    │  │  proxy  │   │   bank   │   │  (discover)  │   │
//!                    │  └────┬────┘   └──────────┘   └──────┬───────┘   │
//!                    │       │            ▲                 │           │
//!                    │       ▼            │ outcome         ▼           │
//!   Client Response  │  ┌─────────┐       │          ┌─────────────┐    │
//!   ◀────────────────┼──│  relay  │◀──────┴──────────│  forward to │◀───┼── Backend
//!                    │  └─────────┘                  │  instance   │    │   instance
//!                    │                               └─────────────┘    │
//!                    │  ┌──────────────┐   ┌──────────────────────┐     │
//!                    │  │ health sweep │──▶│ serviceRegistry.json │     │
//!                    │  └──────────────┘   └──────────────────────┘     │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use tokio::net::TcpListener;

use api_gateway::config::load_config;
use api_gateway::lifecycle::{signals, Shutdown};
use api_gateway::observability::{logging, metrics};
use api_gateway::GatewayServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var_os("GATEWAY_CONFIG").map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        registry = %config.registry.path,
        failure_threshold = config.breaker.failure_threshold,
        cooldown_ms = config.breaker.cooldown_ms,
        health_interval_ms = config.registry.health_interval_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::bootstrap(config).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
