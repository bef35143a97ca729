//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nft_gateway_requests_total` (counter): HTTP requests by method, path, status
//! - `nft_gateway_request_duration_seconds` (histogram): HTTP latency
//! - `nft_gateway_broadcasts_total` (counter): pipeline runs by operation, outcome
//! - `nft_gateway_broadcast_duration_seconds` (histogram): pipeline latency by operation
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; the Prometheus exporter is
//!   installed once in `main`
//! - Outcome label is the error kind, or `success`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("nft_gateway_requests_total", &labels[..]).increment(1);
    histogram!("nft_gateway_request_duration_seconds", &labels[..]).record(start.elapsed().as_secs_f64());
}

/// Record a finished broadcast pipeline run.
pub fn record_broadcast(operation: &'static str, outcome: &'static str, start: Instant) {
    counter!("nft_gateway_broadcasts_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    histogram!("nft_gateway_broadcast_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}
