//! Metrics collection and exposition.
//!
//! # Metrics
//! - `console_requests_total` (counter): requests by status
//! - `console_request_duration_seconds` (histogram): latency distribution
//! - `console_rewrites_total` (counter): substitutions by transform
//! - `console_rewrite_cache_total` (counter): cache lookups by result

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::rewrite::Transform;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, start: Instant) {
    counter!("console_requests_total", "status" => status.to_string()).increment(1);
    histogram!("console_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rewrite(transform: Transform, substitutions: usize) {
    counter!("console_rewrites_total", "transform" => transform.as_str()).increment(substitutions as u64);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("console_rewrite_cache_total", "result" => result).increment(1);
}
