//! Admission decision for candidate log records.
//!
//! # Rules
//! 1. Below the resolved override severity: reject
//! 2. At or below the sampling severity while the trace is unsampled: reject
//! 3. Otherwise admit
//!
//! The gate only decides; forwarding or dropping is the caller's job.

use std::sync::Arc;
use crate::gate::context::TraceContext;
use crate::levels::{LevelRegistry, Severity};

/// A log record as seen by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub logger: &'a str,
    pub severity: Severity,
}

impl<'a> LogRecord<'a> {
    pub fn new(logger: &'a str, severity: Severity) -> Self {
        Self { logger, severity }
    }
}

/// Combines registry overrides with the ambient trace's sampled flag.
pub struct RecordGate<C> {
    registry: Arc<LevelRegistry>,
    context: C,
}

impl<C: TraceContext> RecordGate<C> {
    pub fn new(registry: Arc<LevelRegistry>, context: C) -> Self {
        Self { registry, context }
    }

    pub fn admit(&self, record: &LogRecord<'_>) -> bool {
        let decision = self.registry.get_log_decision(record.logger);

        if let Some(want) = decision.severity {
            if record.severity < want {
                return false;
            }
        }

        match decision.sampling_severity {
            Some(sampling) if record.severity <= sampling => self.context.is_sampled(),
            _ => true,
        }
    }
}
