//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dial_cycles_total` (counter): control cycles by outcome
//! - `dial_skipped_entries_total` (counter): snapshot entries skipped, by error kind
//! - `dial_sample_ratio` (gauge): ratio currently in force
//! - `dial_active_overrides` (gauge): override counts by table (`active`, `sampling`)
//!
//! # Design Decisions
//! - The exporter is optional; without it the macros record into a no-op recorder

use std::net::SocketAddr;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// One control cycle finished with `outcome` (`applied` or an error kind).
pub fn record_cycle(outcome: &'static str) {
    counter!("dial_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_skipped_entry(kind: &'static str) {
    counter!("dial_skipped_entries_total", "reason" => kind).increment(1);
}

pub fn record_sample_ratio(ratio: f64) {
    gauge!("dial_sample_ratio").set(ratio);
}

pub fn record_active_overrides(active: usize, sampling: usize) {
    gauge!("dial_active_overrides", "table" => "active").set(active as f64);
    gauge!("dial_active_overrides", "table" => "sampling").set(sampling as f64);
}
