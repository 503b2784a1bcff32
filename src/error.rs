//! Error taxonomy for the gateway.
//!
//! `PersistenceError` belongs to the registry store and is surfaced to callers
//! of mutating registry operations. `GatewayError` is what request handlers
//! return; it knows how to render itself as an HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure reading or writing the persisted registry.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem access failed.
    #[error("registry store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted document could not be encoded or decoded.
    #[error("registry store is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors produced while handling an inbound request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No instance is registered under the requested service name.
    #[error("Service '{0}' not found")]
    ServiceUnknown(String),

    /// The path is not one the gateway serves.
    #[error("No route for {0}")]
    NoRoute(String),

    /// The breaker for this service is open and the cooldown has not elapsed.
    #[error("Service '{0}' is temporarily unavailable")]
    CircuitOpen(String),

    /// A resolved instance could not be reached at all.
    #[error("Upstream request to {url} failed: {reason}")]
    DownstreamUnavailable { url: String, reason: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("Missing or invalid admin credentials")]
    Unauthorized,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl GatewayError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ServiceUnknown(_) => StatusCode::NOT_FOUND,
            GatewayError::NoRoute(_) => StatusCode::NOT_FOUND,
            GatewayError::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::DownstreamUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::InvalidRegistration(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            GatewayError::DownstreamUnavailable { reason, .. } => ErrorBody {
                message: "Internal API gateway error".to_string(),
                error: Some(reason.clone()),
            },
            GatewayError::Persistence(e) => ErrorBody {
                message: "Internal API gateway error".to_string(),
                error: Some(e.to_string()),
            },
            other => ErrorBody {
                message: other.to_string(),
                error: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
