//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! tracing events from every module
//!     → logging.rs console layer (logger tree levels + suppression hook)
//!     → logging.rs export layer (logger tree levels + RecordGate), optional
//!
//! control loop and registry
//!     → metrics.rs (cycle outcomes, skipped entries, ratio, override counts)
//!     → Prometheus scrape endpoint, optional
//! ```
//!
//! # Design Decisions
//! - Filters are re-evaluated per event so remote level changes apply at once
//! - Metrics are recorded only on the control path, never per log record

pub mod logging;
pub mod metrics;
