//! Aggregate `GET /health`.

use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::state::GatewayState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    Up,
    Down,
}

/// Report `UP`/`DOWN` for every registered service.
///
/// Each check goes through `discover`, so it advances the round-robin order
/// exactly like a proxied request does.
pub async fn aggregate_health(
    State(state): State<GatewayState>,
) -> Json<BTreeMap<String, ServiceStatus>> {
    let mut report = BTreeMap::new();

    for service in state.registry.service_names().await {
        let status = match state.registry.discover(&service).await {
            Ok(Some(url)) => {
                if state.prober.is_alive(&url).await {
                    ServiceStatus::Up
                } else {
                    ServiceStatus::Down
                }
            }
            Ok(None) => ServiceStatus::Down,
            Err(e) => {
                tracing::warn!(service = %service, error = %e, "Discovery failed during health report");
                ServiceStatus::Down
            }
        };
        report.insert(service, status);
    }

    Json(report)
}
