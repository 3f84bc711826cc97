//! Logger-level subsystem.
//!
//! # Data Flow
//! ```text
//! LoggerBackend (tree.rs or host framework)
//!     → registry.rs snapshots `available` once at creation
//!     → registry.rs installs the suppression hook on local sinks
//!
//! On apply (control loop only):
//!     snapshot.logLevels → baseline capture → min(baseline, override) → native level
//!     snapshot.{logLevels, samplingLogLevels} → one atomic swap of the override pair
//!
//! Hot path (any thread):
//!     get_log_decision(logger) → most-specific override, or absent
//! ```

pub mod backend;
pub mod registry;
pub mod severity;
pub mod tree;

pub use backend::{LoggerBackend, NativeLevel, RecordFilter, ROOT_LOGGER_NAME};
pub use registry::{ApplyOutcome, LevelRegistry, LogDecision, Overrides};
pub use severity::Severity;
pub use tree::{LoggerTree, SinkKind};
