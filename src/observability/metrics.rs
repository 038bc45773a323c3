//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, handling path
//! - `proxy_request_duration_seconds` (histogram): latency by handling path
//!
//! Handling is one of `preflight`, `redirect`, `html`, `passthrough` or `error`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, handling: &'static str, start_time: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_owned(),
        "status" => status.to_string(),
        "handling" => handling
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "handling" => handling)
        .record(start_time.elapsed().as_secs_f64());
}
