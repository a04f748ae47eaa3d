//! Metrics collection and exposition.
//!
//! # Metrics
//! - `transit_provider_requests_total` (counter): attempts by operation, status
//! - `transit_provider_response_seconds` (histogram): latency distribution
//! - `transit_retries_total` (counter): retries by operation
//! - `transit_rate_limited_total` (counter): 429 responses by operation
//! - `transit_cache_hits_total` / `transit_cache_misses_total` (counters)
//! - `transit_stale_fallbacks_total` (counter): degraded reads served
//! - `transit_cache_entries` (gauge): fast-tier size per cache
//! - `transit_connection_transitions_total` (counter): state machine moves

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
///
/// Failure is logged, not fatal: the client works without exposition.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

pub fn record_provider_call(operation: &str, status: u16) {
    counter!(
        "transit_provider_requests_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_response_time(operation: &str, elapsed: std::time::Duration) {
    histogram!(
        "transit_provider_response_seconds",
        "operation" => operation.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_retry(operation: &str) {
    counter!("transit_retries_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_rate_limited(operation: &str) {
    counter!("transit_rate_limited_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_cache_hit(cache: &str) {
    counter!("transit_cache_hits_total", "cache" => cache.to_string()).increment(1);
}

pub fn record_cache_miss(cache: &str) {
    counter!("transit_cache_misses_total", "cache" => cache.to_string()).increment(1);
}

pub fn record_stale_fallback(cache: &str) {
    counter!("transit_stale_fallbacks_total", "cache" => cache.to_string()).increment(1);
}

pub fn record_cache_size(cache: &str, entries: usize) {
    gauge!("transit_cache_entries", "cache" => cache.to_string()).set(entries as f64);
}

pub fn record_connection_state(state: &str) {
    counter!(
        "transit_connection_transitions_total",
        "state" => state.to_string()
    )
    .increment(1);
}
