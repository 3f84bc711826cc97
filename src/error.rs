//! Error taxonomy for the control plane.
//!
//! # Design Decisions
//! - Hot-path queries never return these; absence of an override is not an error
//! - Entry-level errors (`UnknownSeverity`, `UnknownLogger`) skip one entry only
//! - Cycle-level errors (`Transport`, `Parse`) skip one control-loop cycle only

use thiserror::Error;

/// Errors raised by the level registry, the sampler and the control loop.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DialError {
    /// Sample ratio outside `[0.0, 1.0]`. The previous ratio stays in effect.
    #[error("ratio must be in range [0.0, 1.0], got {ratio}")]
    InvalidArgument { ratio: f64 },

    /// Level name that does not map to a severity.
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),

    /// Override target that the runtime never registered.
    #[error("logger not found: {0}")]
    UnknownLogger(String),

    /// Control endpoint could not be reached or answered with a failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Payload could not be decoded into a configuration snapshot.
    #[error("parse error: {0}")]
    Parse(String),
}

impl DialError {
    /// Short label used for metrics and structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DialError::InvalidArgument { .. } => "invalid_argument",
            DialError::UnknownSeverity(_) => "unknown_severity",
            DialError::UnknownLogger(_) => "unknown_logger",
            DialError::Transport(_) => "transport",
            DialError::Parse(_) => "parse",
        }
    }
}

/// Result type for control-plane operations.
pub type DialResult<T> = Result<T, DialError>;
