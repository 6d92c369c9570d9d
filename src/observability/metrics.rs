//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_resolutions_total` (counter): resolutions by outcome
//! - `router_request_duration_seconds` (histogram): latency of dispatched requests
//! - `router_requests_total` (counter): dispatched requests by method, status
//! - `router_mutations_total` (counter): table/chain mutations by kind
//! - `router_routes` (gauge): entries in the route table
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter runs on its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_resolution(outcome: &'static str) {
    counter!("router_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    counter!("router_requests_total", "method" => method.clone(), "status" => status).increment(1);
    histogram!("router_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_route_mutation(kind: &'static str) {
    counter!("router_mutations_total", "target" => "routes", "kind" => kind).increment(1);
}

pub fn record_middleware_mutation(kind: &'static str) {
    counter!("router_mutations_total", "target" => "middlewares", "kind" => kind).increment(1);
}

pub fn record_route_count(count: usize) {
    gauge!("router_routes").set(count as f64);
}
