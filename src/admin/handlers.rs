use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::GatewayError;
use crate::registry::RegistryTable;
use crate::resilience::BreakerSnapshot;
use crate::state::GatewayState;

const DEFAULT_HOST: &str = "http://localhost";

/// Body of `POST /registry` and `DELETE /registry`.
///
/// Either `url`, or `port` with an optional `host` (defaults to
/// `http://localhost`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub service_name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub host: Option<String>,
}

impl RegistrationRequest {
    /// Validate and produce the instance url used as its identity.
    pub fn resolve(&self) -> Result<(String, String), GatewayError> {
        let service = self.service_name.trim();
        if service.is_empty() || service.contains('/') {
            return Err(GatewayError::InvalidRegistration(format!(
                "bad service name '{}'",
                self.service_name
            )));
        }

        let raw = match (&self.url, self.port) {
            (Some(url), _) => url.clone(),
            (None, Some(port)) => format!(
                "{}:{}",
                self.host.as_deref().unwrap_or(DEFAULT_HOST).trim_end_matches('/'),
                port
            ),
            (None, None) => {
                return Err(GatewayError::InvalidRegistration(
                    "either url or port is required".to_string(),
                ))
            }
        };

        let parsed = url::Url::parse(&raw)
            .map_err(|e| GatewayError::InvalidRegistration(format!("bad url '{}': {}", raw, e)))?;
        if parsed.scheme() != "http" || parsed.host_str().is_none() {
            return Err(GatewayError::InvalidRegistration(format!(
                "'{}' must be an http:// url with a host",
                raw
            )));
        }

        Ok((service.to_string(), raw.trim_end_matches('/').to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub url: String,
}

/// `GET /registry`: raw table, no rotation.
pub async fn list_registry(State(state): State<GatewayState>) -> Json<RegistryTable> {
    Json(state.registry.snapshot().await)
}

/// `POST /registry`
pub async fn register_instance(
    State(state): State<GatewayState>,
    Json(request): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), GatewayError> {
    let (service, url) = request.resolve()?;
    let url = state.registry.register(&service, &url).await?;
    Ok((StatusCode::CREATED, Json(RegistrationResponse { url })))
}

/// `DELETE /registry`
pub async fn unregister_instance(
    State(state): State<GatewayState>,
    Json(request): Json<RegistrationRequest>,
) -> Result<StatusCode, GatewayError> {
    let (service, url) = request.resolve()?;
    state.registry.unregister(&service, &url).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /breakers`
pub async fn list_breakers(
    State(state): State<GatewayState>,
) -> Json<BTreeMap<&'static str, BreakerSnapshot>> {
    Json(
        state
            .breakers
            .snapshot()
            .into_iter()
            .map(|(svc, snapshot)| (svc.as_str(), snapshot))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> RegistrationRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_resolve_explicit_url() {
        let (service, url) = request(r#"{"serviceName": "itemService", "url": "http://10.0.0.5:3002/"}"#)
            .resolve()
            .unwrap();
        assert_eq!(service, "itemService");
        assert_eq!(url, "http://10.0.0.5:3002");
    }

    #[test]
    fn test_resolve_port_with_default_host() {
        let (_, url) = request(r#"{"serviceName": "userService", "port": 3001}"#)
            .resolve()
            .unwrap();
        assert_eq!(url, "http://localhost:3001");

        let (_, url) = request(r#"{"serviceName": "userService", "port": 3001, "host": "http://users"}"#)
            .resolve()
            .unwrap();
        assert_eq!(url, "http://users:3001");
    }

    #[test]
    fn test_resolve_rejects_bad_input() {
        for body in [
            r#"{"serviceName": "", "url": "http://localhost:1"}"#,
            r#"{"serviceName": "a/b", "url": "http://localhost:1"}"#,
            r#"{"serviceName": "itemService"}"#,
            r#"{"serviceName": "itemService", "url": "https://localhost:1"}"#,
            r#"{"serviceName": "itemService", "url": "localhost"}"#,
        ] {
            assert!(
                matches!(request(body).resolve(), Err(GatewayError::InvalidRegistration(_))),
                "accepted {}",
                body
            );
        }
    }
}
