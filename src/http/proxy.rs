//! Proxy handler for `/api/{service}/{rest...}`.
//!
//! # Request Flow
//! ```text
//! RouteTarget::from_uri
//!     → breaker gate (known services only): reject, admit, or admit as probe
//!     → registry.discover (rotates round-robin order)
//!     → forward method + body + authorization to {instance}{rest}
//!       (bounded by timeouts.upstream_ms)
//!     → 2xx: breaker success; anything else, including an expired call: breaker failure
//!     → relay status, content-type and body
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, Request, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper::body::{Bytes, Incoming};
use std::time::Instant;
use tokio::time;

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::resilience::BreakerPermit;
use crate::routing::{KnownService, RouteTarget};
use crate::state::GatewayState;

/// Main proxy handler. Also serves as the router fallback.
pub async fn proxy_handler(State(state): State<GatewayState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let Some(target) = RouteTarget::from_uri(request.uri()) else {
        return GatewayError::NoRoute(request.uri().path().to_string()).into_response();
    };
    let service = target.service.clone();

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        service = %service,
        path = %target.downstream_path,
        "Proxying request"
    );

    let response = match proxy(&state, target, request).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                GatewayError::CircuitOpen(_) | GatewayError::ServiceUnknown(_) => {
                    tracing::warn!(request_id = %request_id, service = %service, error = %e, "Request rejected")
                }
                _ => tracing::error!(request_id = %request_id, service = %service, error = %e, "Request failed"),
            }
            e.into_response()
        }
    };

    metrics::record_request(&service, response.status().as_u16(), start);
    response
}

async fn proxy(
    state: &GatewayState,
    target: RouteTarget,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    // 1. Circuit breaker gate. Unknown names bypass it.
    let permit = match target.service.parse::<KnownService>() {
        Ok(known) => match state.breakers.get(known) {
            Some(breaker) => Some(
                breaker
                    .try_acquire()
                    .ok_or_else(|| GatewayError::CircuitOpen(target.service.clone()))?,
            ),
            None => None,
        },
        Err(_) => None,
    };

    // 2. Service discovery
    let instance = state
        .registry
        .discover(&target.service)
        .await?
        .ok_or_else(|| GatewayError::ServiceUnknown(target.service.clone()))?;

    // 3. Forward
    let (parts, body) = request.into_parts();
    let limit = state.config.limits.max_body_bytes;
    let body = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| GatewayError::PayloadTooLarge(limit))?;

    let deadline = state.config.timeouts.upstream();
    let outcome = match downstream_request(
        &instance,
        &target.downstream_path,
        parts.method,
        parts.headers.get(AUTHORIZATION),
        body,
    ) {
        Ok(req) => match time::timeout(deadline, state.client.request(req)).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(format!("no response within {}ms", deadline.as_millis())),
        },
        Err(reason) => Err(reason),
    };

    // 4. Feed the outcome back into the breaker
    match outcome {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                settle(permit, true);
            } else {
                tracing::warn!(service = %target.service, url = %instance, status = %status, "Downstream returned error status");
                settle(permit, false);
            }
            Ok(relay(response))
        }
        Err(reason) => {
            settle(permit, false);
            Err(GatewayError::DownstreamUnavailable {
                url: instance,
                reason,
            })
        }
    }
}

fn settle(permit: Option<BreakerPermit>, success: bool) {
    if let Some(permit) = permit {
        if success {
            permit.succeed();
        } else {
            permit.fail();
        }
    }
}

/// Build the downstream request. Only `authorization` is carried over.
fn downstream_request(
    instance: &str,
    path: &str,
    method: Method,
    authorization: Option<&HeaderValue>,
    body: Bytes,
) -> Result<Request<Body>, String> {
    let uri: Uri = format!("{}{}", instance.trim_end_matches('/'), path)
        .parse()
        .map_err(|e| format!("invalid downstream url: {}", e))?;

    let has_body = !body.is_empty();
    let mut request = Request::new(Body::from(body));
    *request.method_mut() = method;
    *request.uri_mut() = uri;

    let headers = request.headers_mut();
    if let Some(auth) = authorization {
        headers.insert(AUTHORIZATION, auth.clone());
    }
    if has_body {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(request)
}

/// Relay a downstream response: status, content-type and body.
fn relay(response: hyper::Response<Incoming>) -> Response {
    let (parts, body) = response.into_parts();
    let mut relayed = Response::new(Body::new(body));
    *relayed.status_mut() = parts.status;
    if let Some(content_type) = parts.headers.get(CONTENT_TYPE) {
        relayed.headers_mut().insert(CONTENT_TYPE, content_type.clone());
    }
    relayed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downstream_request_copies_only_authorization() {
        let auth = HeaderValue::from_static("Bearer token");
        let req = downstream_request(
            "http://localhost:3001/",
            "/auth/login?x=1",
            Method::POST,
            Some(&auth),
            Bytes::from_static(b"{\"email\":\"a@b.c\"}"),
        )
        .unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri(), "http://localhost:3001/auth/login?x=1");
        assert_eq!(req.headers().get(AUTHORIZATION).unwrap(), "Bearer token");
        assert_eq!(req.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(req.headers().len(), 2);
    }

    #[test]
    fn test_empty_body_sets_no_content_type() {
        let req = downstream_request("http://localhost:3002", "/items", Method::GET, None, Bytes::new())
            .unwrap();
        assert!(req.headers().is_empty());
    }

    #[test]
    fn test_invalid_instance_url_is_rejected() {
        let err = downstream_request("not a url", "/", Method::GET, None, Bytes::new()).unwrap_err();
        assert!(err.contains("invalid downstream url"));
    }
}
