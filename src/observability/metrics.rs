//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_requests_total` (counter): requests by method, status
//! - `gatekeeper_request_duration_seconds` (histogram): latency distribution
//! - `gatekeeper_decisions_total` (counter): gate outcomes
//! - `gatekeeper_failures_total` (counter): collaborator failures by service
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs the exporter

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one served request and its latency.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gatekeeper_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gatekeeper_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Count a gate decision by outcome.
pub fn record_decision(outcome: &'static str) {
    counter!("gatekeeper_decisions_total", "outcome" => outcome).increment(1);
}

/// Count a collaborator failure by service.
pub fn record_failure(service: &'static str) {
    counter!("gatekeeper_failures_total", "service" => service).increment(1);
}
