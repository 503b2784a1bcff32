//! Route lookup for proxied requests.
//!
//! # Responsibilities
//! - Split `/api/{service}/{rest...}` into a service name and downstream path
//! - Keep the query string on the downstream path
//!
//! # Design Decisions
//! - Prefix matching only, no regex
//! - Explicit `None` for paths outside `/api/`

use axum::http::Uri;

/// Prefix under which every proxied service lives.
pub const API_PREFIX: &str = "/api/";

/// Where an inbound request should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    /// Registry name taken from the first path segment.
    pub service: String,
    /// Remainder of the path, including the query string. Always starts with `/`.
    pub downstream_path: String,
}

impl RouteTarget {
    /// Resolve the target of an inbound request.
    pub fn from_uri(uri: &Uri) -> Option<Self> {
        let rest = uri.path().strip_prefix(API_PREFIX)?;
        let (service, remainder) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        if service.is_empty() {
            return None;
        }

        let mut downstream_path = if remainder.is_empty() {
            "/".to_string()
        } else {
            remainder.to_string()
        };
        if let Some(query) = uri.query() {
            downstream_path.push('?');
            downstream_path.push_str(query);
        }

        Some(Self {
            service: service.to_string(),
            downstream_path,
        })
    }
}
