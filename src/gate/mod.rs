//! Log-record gate.
//!
//! # Data Flow
//! ```text
//! candidate record (logger, severity)
//!     → LevelRegistry::get_log_decision
//!     → coarse severity check
//!     → sampling-correlated check against TraceContext
//!     → admit / reject
//! ```

pub mod context;
pub mod record;

pub use context::{CurrentTrace, TraceContext, TraceScope};
pub use record::{LogRecord, RecordGate};
