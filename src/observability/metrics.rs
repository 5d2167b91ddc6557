//! Metrics collection and exposition.
//!
//! # Metrics
//! - `surreal_link_operations_total` (counter): operations by kind and outcome
//! - `surreal_link_operation_duration_seconds` (histogram): latency by kind
//! - `surreal_link_database_health` (gauge): 1=healthy, 0=unhealthy
//! - `surreal_link_selections_total` (counter): namespace/database switches by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users
//!   pay nothing unless they opt in
//! - Labels are `&'static str` to keep cardinality bounded

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics recorder"),
    }
}

/// Record one finished operation.
pub fn record_operation(operation: &'static str, outcome: &'static str, start: Instant) {
    counter!(
        "surreal_link_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        "surreal_link_operation_duration_seconds",
        "operation" => operation
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the result of a health probe.
pub fn record_health(healthy: bool) {
    gauge!("surreal_link_database_health").set(if healthy { 1.0 } else { 0.0 });
}

/// Record a namespace/database switch.
pub fn record_selection(ok: bool) {
    counter!(
        "surreal_link_selections_total",
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}
