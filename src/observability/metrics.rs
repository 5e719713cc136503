//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, connections)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): transport requests by protocol, operation, status
//! - `gateway_request_duration_seconds` (histogram): transport latency
//! - `gateway_rpc_requests_total` (counter): RPC service calls by operation, code
//! - `gateway_rpc_duration_seconds` (histogram): RPC service latency
//! - `gateway_active_connections` (gauge): current connection count
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording before an exporter is installed is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::service::Operation;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one transport-level request.
pub fn record_request(protocol: &'static str, operation: &'static str, status: String, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(
        "gateway_requests_total",
        "protocol" => protocol,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "protocol" => protocol,
        "operation" => operation
    )
    .record(elapsed);
}

/// Record one RPC service call.
pub fn record_rpc(operation: Operation, code: tonic::Code, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(
        "gateway_rpc_requests_total",
        "operation" => operation.rpc_name(),
        "code" => format!("{:?}", code)
    )
    .increment(1);
    metrics::histogram!("gateway_rpc_duration_seconds", "operation" => operation.rpc_name())
        .record(elapsed);
}

pub fn set_active_connections(count: u64) {
    metrics::gauge!("gateway_active_connections").set(count as f64);
}
