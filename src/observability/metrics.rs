//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): proxied requests by service, status
//! - `gateway_request_duration_seconds` (histogram): latency by service
//! - `gateway_breaker_open` (gauge): 1=open, 0=closed
//! - `gateway_registry_evictions_total` (counter): instances dropped by health sweeps
//! - `gateway_registry_instances` (gauge): registered instances per service
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(service: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "service" => service.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_breaker_state(service: &str, open: bool) {
    gauge!("gateway_breaker_open", "service" => service.to_string())
        .set(if open { 1.0 } else { 0.0 });
}

pub fn record_eviction(service: &str) {
    counter!("gateway_registry_evictions_total", "service" => service.to_string()).increment(1);
}

pub fn record_registry_size(service: &str, instances: usize) {
    gauge!("gateway_registry_instances", "service" => service.to_string()).set(instances as f64);
}
