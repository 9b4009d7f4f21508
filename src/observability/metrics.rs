//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_rate_limited_total` (counter): rejections by backend
//! - `gatekeeper_rate_limit_store_errors_total` (counter): shared store failures
//! - `gatekeeper_auth_outcomes_total` (counter): resolved callers by credential
//! - `gatekeeper_rate_limit_tracked_keys` (gauge): local records after a sweep
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_rate_limited(backend: &'static str) {
    ::metrics::counter!("gatekeeper_rate_limited_total", "backend" => backend).increment(1);
}

pub fn record_store_error() {
    ::metrics::counter!("gatekeeper_rate_limit_store_errors_total").increment(1);
}

pub fn record_auth_outcome(outcome: &'static str) {
    ::metrics::counter!("gatekeeper_auth_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_tracked_keys(count: usize) {
    ::metrics::gauge!("gatekeeper_rate_limit_tracked_keys").set(count as f64);
}
