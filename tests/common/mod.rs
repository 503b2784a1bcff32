//! Shared utilities for integration testing.

#![allow(dead_code)]

use api_gateway::{GatewayConfig, GatewayServer, GatewayState, Shutdown};
use axum::{http::StatusCode, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral port.
pub async fn start_backend(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a programmable mock backend. Every path, `/health` included,
/// answers with whatever `f` returns.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let f = Arc::new(f);
    let app = Router::new().fallback(move || {
        let f = f.clone();
        async move {
            let (status, body) = f().await;
            (StatusCode::from_u16(status).unwrap(), body)
        }
    });
    start_backend(app).await
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn http_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A gateway running on an ephemeral port with its registry in a temp dir.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub state: GatewayState,
    shutdown: Shutdown,
    _dir: TempDir,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_gateway<F>(configure: F) -> TestGateway
where
    F: FnOnce(&mut GatewayConfig),
{
    let dir = tempfile::tempdir().unwrap();

    let mut config = GatewayConfig::default();
    config.registry.path = dir
        .path()
        .join("serviceRegistry.json")
        .to_string_lossy()
        .into_owned();
    // Sweeps are driven by hand in tests
    config.registry.health_interval_ms = 600_000;
    config.registry.probe_timeout_ms = 500;
    config.observability.metrics_enabled = false;
    configure(&mut config);

    let server = GatewayServer::bootstrap(config).await.unwrap();
    let state = server.state().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway {
        addr,
        state,
        shutdown,
        _dir: dir,
    }
}
