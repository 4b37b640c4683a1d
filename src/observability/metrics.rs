//! Metrics collection and exposition.
//!
//! # Metrics
//! - `launcher_requests_total` (counter): requests by method, status
//! - `launcher_request_duration_seconds` (histogram): latency distribution
//! - `launcher_rate_limited_total` (counter): requests rejected by the limiter
//! - `launcher_rom_plays_total` (counter): play events written
//! - `launcher_security_events_total` (counter): security events by type

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "launcher_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("launcher_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    metrics::counter!("launcher_rate_limited_total").increment(1);
}

pub fn record_play() {
    metrics::counter!("launcher_rom_plays_total").increment(1);
}

pub fn record_security_event(event_type: &'static str) {
    metrics::counter!("launcher_security_events_total", "event_type" => event_type).increment(1);
}
