//! Contract of the underlying logger registry.
//!
//! # Responsibilities
//! - Enumerate every known logger with its effective level
//! - Get/set the native (possibly inherited) level of one logger
//! - Accept a single per-record filter applied before non-export sinks

use std::sync::Arc;
use crate::levels::Severity;

/// Name of the hierarchy's terminal ancestor.
pub const ROOT_LOGGER_NAME: &str = "";

/// A logger's own configured level. `None` inherits from the nearest ancestor.
pub type NativeLevel = Option<Severity>;

/// Predicate consulted for every candidate record on non-export sinks.
pub trait RecordFilter: Send + Sync {
    /// Returns true if a record from `logger` at `severity` may pass.
    fn permits(&self, logger: &str, severity: Severity) -> bool;
}

impl<F> RecordFilter for F
where
    F: Fn(&str, Severity) -> bool + Send + Sync,
{
    fn permits(&self, logger: &str, severity: Severity) -> bool {
        self(logger, severity)
    }
}

/// The logging framework the registry drives.
pub trait LoggerBackend: Send + Sync {
    /// Every known logger name with its effective level.
    fn loggers(&self) -> Vec<(String, Severity)>;

    /// Native level of `logger`, or `None` if the logger is unknown.
    fn native_level(&self, logger: &str) -> Option<NativeLevel>;

    /// Effective level of `logger`, resolved through its ancestors.
    fn effective_level(&self, logger: &str) -> Severity;

    /// Replace the native level of a known logger.
    fn set_native_level(&self, logger: &str, level: NativeLevel);

    /// Install the record filter applied to non-export sinks.
    fn install_filter(&self, filter: Arc<dyn RecordFilter>);
}

/// Normalize a configured logger name, mapping `ROOT` to the root name.
pub fn normalize_logger_name(name: &str) -> &str {
    let name = name.trim();
    if name.eq_ignore_ascii_case("ROOT") {
        ROOT_LOGGER_NAME
    } else {
        name
    }
}
