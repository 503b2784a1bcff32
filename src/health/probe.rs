//! Liveness probe against `{url}/health`.

use axum::body::Body;
use axum::http::Request;
use std::time::Duration;
use tokio::time;

use crate::http::client::HttpClient;

/// Path every downstream service answers when ready.
pub const HEALTH_PATH: &str = "/health";

/// Issues bounded `GET {url}/health` requests.
#[derive(Clone)]
pub struct Prober {
    client: HttpClient,
    timeout: Duration,
}

impl Prober {
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// True iff the instance answered 2xx within the timeout.
    pub async fn is_alive(&self, base_url: &str) -> bool {
        let uri = format!("{}{}", base_url.trim_end_matches('/'), HEALTH_PATH);
        let request = match Request::builder()
            .method("GET")
            .uri(&uri)
            .header("user-agent", "api-gateway-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(url = %base_url, error = %e, "Health check failed: invalid url");
                return false;
            }
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(url = %base_url, status = %response.status(), "Health check failed: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::warn!(url = %base_url, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(url = %base_url, "Health check failed: timeout");
                false
            }
        }
    }
}
