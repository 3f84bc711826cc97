//! In-process hierarchical logger registry.
//!
//! # Responsibilities
//! - Hold the native level of every registered logger
//! - Resolve effective levels by inheriting from the nearest configured ancestor
//! - Route records to sinks, applying the installed filter to non-export sinks
//!
//! # Design Decisions
//! - Registering `a.b.c` also registers `a.b` and `a` (inheriting)
//! - The root logger always carries a level
//! - Filter is swapped atomically; readers never take a lock

use std::sync::Arc;
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use crate::levels::backend::{LoggerBackend, NativeLevel, RecordFilter, ROOT_LOGGER_NAME};
use crate::levels::Severity;

/// Kind of sink a record is being routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Local appenders (console, files). Subject to the installed filter.
    Local,
    /// The telemetry-export sink. Never filtered by the installed filter.
    Export,
}

struct InstalledFilter(Arc<dyn RecordFilter>);

/// Logback-style logger hierarchy.
pub struct LoggerTree {
    levels: DashMap<String, NativeLevel>,
    filter: ArcSwapOption<InstalledFilter>,
}

impl LoggerTree {
    /// Create a tree holding only the root logger at `root_level`.
    pub fn new(root_level: Severity) -> Self {
        let levels = DashMap::new();
        levels.insert(ROOT_LOGGER_NAME.to_string(), Some(root_level));
        Self {
            levels,
            filter: ArcSwapOption::empty(),
        }
    }

    /// Register a logger (and its ancestors) with an optional native level.
    ///
    /// Re-registering an existing logger with `Some` level replaces it.
    pub fn register(&self, name: &str, level: NativeLevel) {
        let mut ancestor = name;
        while let Some(idx) = ancestor.rfind('.') {
            ancestor = &ancestor[..idx];
            self.levels.entry(ancestor.to_string()).or_insert(None);
        }
        match level {
            Some(_) => {
                self.levels.insert(name.to_string(), level);
            }
            None => {
                self.levels.entry(name.to_string()).or_insert(None);
            }
        }
    }

    /// True if a record at `severity` reaches the sinks at all.
    pub fn is_enabled(&self, logger: &str, severity: Severity) -> bool {
        severity >= self.effective_level(logger)
    }

    /// True if the installed filter lets the record through.
    pub fn passes_filter(&self, logger: &str, severity: Severity) -> bool {
        match self.filter.load().as_ref() {
            Some(installed) => installed.0.permits(logger, severity),
            None => true,
        }
    }

    /// Full routing decision for one sink.
    pub fn accepts(&self, logger: &str, severity: Severity, sink: SinkKind) -> bool {
        if !self.is_enabled(logger, severity) {
            return false;
        }
        match sink {
            SinkKind::Export => true,
            SinkKind::Local => self.passes_filter(logger, severity),
        }
    }

    fn root_level(&self) -> Severity {
        self.levels
            .get(ROOT_LOGGER_NAME)
            .and_then(|r| *r.value())
            .unwrap_or(Severity::Info)
    }
}

impl LoggerBackend for LoggerTree {
    fn loggers(&self) -> Vec<(String, Severity)> {
        let names: Vec<String> = self.levels.iter().map(|r| r.key().clone()).collect();
        names
            .into_iter()
            .map(|name| {
                let level = self.effective_level(&name);
                (name, level)
            })
            .collect()
    }

    fn native_level(&self, logger: &str) -> Option<NativeLevel> {
        self.levels.get(logger).map(|r| *r.value())
    }

    fn effective_level(&self, logger: &str) -> Severity {
        let mut name = logger;
        loop {
            if let Some(Some(level)) = self.levels.get(name).map(|r| *r.value()) {
                return level;
            }
            match name.rfind('.') {
                Some(idx) => name = &name[..idx],
                None => break,
            }
        }
        self.root_level()
    }

    fn set_native_level(&self, logger: &str, level: NativeLevel) {
        if logger == ROOT_LOGGER_NAME && level.is_none() {
            tracing::debug!("Ignoring attempt to clear the root logger level");
            return;
        }
        if let Some(mut entry) = self.levels.get_mut(logger) {
            *entry = level;
        }
    }

    fn install_filter(&self, filter: Arc<dyn RecordFilter>) {
        self.filter.store(Some(Arc::new(InstalledFilter(filter))));
    }
}
