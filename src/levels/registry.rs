//! Logger-level registry with hierarchical resolution.
//!
//! # State
//! - `available`: every logger known at creation with its effective level (read-only)
//! - `baseline`: native level captured on first override, first writer wins
//! - `overrides`: the `active` + `sampling` pair, published together
//!
//! # Design Decisions
//! - Readers load the override pair through `ArcSwap` and never lock
//! - Installed native level is `min(baseline, override)`: remote overrides can
//!   only make a logger more verbose than the local operator configured
//! - A logger dropped from the next snapshot is restored to its baseline
//! - Without an active override, local sinks are held to the original root level

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use arc_swap::ArcSwap;
use dashmap::DashMap;
use crate::control::snapshot::{ConfigSnapshot, LogLevelEntry};
use crate::error::{DialError, DialResult};
use crate::levels::backend::{
    normalize_logger_name, LoggerBackend, NativeLevel, RecordFilter, ROOT_LOGGER_NAME,
};
use crate::levels::Severity;
use crate::observability::metrics;

/// Override tables derived from one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// Requested (unclamped) thresholds from `logLevels`.
    pub active: HashMap<String, Severity>,
    /// Gate-only thresholds from `samplingLogLevels`.
    pub sampling: HashMap<String, Severity>,
}

/// Result of resolving one logger name against both override tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogDecision {
    pub severity: Option<Severity>,
    pub sampling_severity: Option<Severity>,
}

/// Summary of one `apply` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutcome {
    pub active: usize,
    pub sampling: usize,
    pub restored: usize,
    pub skipped: Vec<DialError>,
}

/// Most-specific-wins lookup: the exact name, then each dot-truncated
/// ancestor, then the root entry.
pub fn resolve_hierarchy<F>(logger: &str, lookup: F) -> Option<Severity>
where
    F: Fn(&str) -> Option<Severity>,
{
    let mut name = logger;
    loop {
        if let Some(level) = lookup(name) {
            return Some(level);
        }
        match name.rfind('.') {
            Some(idx) => name = &name[..idx],
            None => break,
        }
    }
    if name.is_empty() {
        return None;
    }
    lookup(ROOT_LOGGER_NAME)
}

/// Resolve `logger` against one override table.
pub fn effective_override(logger: &str, levels: &HashMap<String, Severity>) -> Option<Severity> {
    resolve_hierarchy(logger, |name| levels.get(name).copied())
}

/// Filter installed into the logging pipeline for non-export sinks.
struct SuppressionHook {
    overrides: Arc<ArcSwap<Overrides>>,
    root_level: Severity,
}

impl RecordFilter for SuppressionHook {
    fn permits(&self, logger: &str, severity: Severity) -> bool {
        let overrides = self.overrides.load();
        let threshold = effective_override(logger, &overrides.active).unwrap_or(self.root_level);
        severity >= threshold
    }
}

/// Owner of all mutable logger-level policy.
pub struct LevelRegistry {
    backend: Arc<dyn LoggerBackend>,
    available: Arc<BTreeMap<String, Severity>>,
    root_level: Severity,
    baseline: DashMap<String, NativeLevel>,
    overrides: Arc<ArcSwap<Overrides>>,
}

impl LevelRegistry {
    /// Snapshot the backend's loggers and install the suppression hook.
    pub fn create(backend: Arc<dyn LoggerBackend>) -> Self {
        let available: BTreeMap<String, Severity> = backend.loggers().into_iter().collect();
        let root_level = available
            .get(ROOT_LOGGER_NAME)
            .copied()
            .unwrap_or_else(|| backend.effective_level(ROOT_LOGGER_NAME));
        let available = Arc::new(available);
        let overrides = Arc::new(ArcSwap::from_pointee(Overrides::default()));

        backend.install_filter(Arc::new(SuppressionHook {
            overrides: overrides.clone(),
            root_level,
        }));

        tracing::info!(
            loggers = available.len(),
            root_level = %root_level,
            "Level registry created"
        );

        Self {
            backend,
            available,
            root_level,
            baseline: DashMap::new(),
            overrides,
        }
    }

    /// Loggers known at creation with their pre-override effective levels.
    pub fn available(&self) -> &BTreeMap<String, Severity> {
        &self.available
    }

    /// Original root level.
    pub fn root_level(&self) -> Severity {
        self.root_level
    }

    /// Current override pair.
    pub fn overrides(&self) -> Arc<Overrides> {
        self.overrides.load_full()
    }

    /// Captured baseline native level, if `logger` was ever overridden.
    pub fn baseline(&self, logger: &str) -> Option<NativeLevel> {
        self.baseline.get(logger).map(|r| *r.value())
    }

    /// Resolve both override tables for `logger`.
    pub fn get_log_decision(&self, logger: &str) -> LogDecision {
        let overrides = self.overrides.load();
        LogDecision {
            severity: effective_override(logger, &overrides.active),
            sampling_severity: effective_override(logger, &overrides.sampling),
        }
    }

    /// Apply a snapshot's level overrides.
    ///
    /// Bad entries are skipped and reported; the rest still apply. The new
    /// `active`/`sampling` pair becomes visible in a single store.
    pub fn apply(&self, snapshot: &ConfigSnapshot) -> ApplyOutcome {
        let previous = self.overrides.load_full();
        let mut outcome = ApplyOutcome::default();

        let mut active = HashMap::new();
        for entry in &snapshot.log_levels {
            match self.resolve_entry(entry) {
                Ok((name, severity)) => {
                    self.install_native(name, severity);
                    active.insert(name.to_string(), severity);
                }
                Err(e) => Self::skip(entry, "logLevels", e, &mut outcome),
            }
        }

        for name in previous.active.keys().filter(|name| !active.contains_key(*name)) {
            if self.restore_native(name) {
                outcome.restored += 1;
            }
        }

        let mut sampling = HashMap::new();
        for entry in &snapshot.sampling_log_levels {
            match self.resolve_entry(entry) {
                Ok((name, severity)) => {
                    sampling.insert(name.to_string(), severity);
                }
                Err(e) => Self::skip(entry, "samplingLogLevels", e, &mut outcome),
            }
        }

        outcome.active = active.len();
        outcome.sampling = sampling.len();
        self.overrides.store(Arc::new(Overrides { active, sampling }));
        metrics::record_active_overrides(outcome.active, outcome.sampling);

        outcome
    }

    fn resolve_entry<'a>(&self, entry: &'a LogLevelEntry) -> DialResult<(&'a str, Severity)> {
        let severity: Severity = entry.level.parse()?;
        let name = normalize_logger_name(&entry.logger);
        if !self.available.contains_key(name) {
            return Err(DialError::UnknownLogger(entry.logger.clone()));
        }
        Ok((name, severity))
    }

    fn skip(entry: &LogLevelEntry, table: &str, error: DialError, outcome: &mut ApplyOutcome) {
        tracing::warn!(
            table,
            logger = %entry.logger,
            level = %entry.level,
            error = %error,
            "Skipping level override"
        );
        metrics::record_skipped_entry(error.kind());
        outcome.skipped.push(error);
    }

    fn install_native(&self, name: &str, requested: Severity) {
        let captured: NativeLevel = *self
            .baseline
            .entry(name.to_string())
            .or_insert_with(|| self.backend.native_level(name).flatten());

        let baseline = captured
            .or_else(|| self.available.get(name).copied())
            .unwrap_or(self.root_level);
        let installed = baseline.min(requested);

        tracing::debug!(
            logger = name,
            requested = %requested,
            installed = %installed,
            "Installing logger level"
        );
        self.backend.set_native_level(name, Some(installed));
    }

    fn restore_native(&self, name: &str) -> bool {
        match self.baseline(name) {
            Some(level) => {
                tracing::debug!(logger = name, level = ?level, "Restoring baseline logger level");
                self.backend.set_native_level(name, level);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::tree::{LoggerTree, SinkKind};

    fn levels(entries: &[(&str, Severity)]) -> HashMap<String, Severity> {
        entries.iter().map(|(n, s)| (n.to_string(), *s)).collect()
    }

    fn snapshot(log: &[(&str, &str)], sampling: &[(&str, &str)]) -> ConfigSnapshot {
        ConfigSnapshot {
            log_levels: log.iter().map(|(l, s)| LogLevelEntry::new(*l, *s)).collect(),
            sampling_log_levels: sampling.iter().map(|(l, s)| LogLevelEntry::new(*l, *s)).collect(),
            ..Default::default()
        }
    }

    fn setup() -> (Arc<LoggerTree>, LevelRegistry) {
        let tree = Arc::new(LoggerTree::new(Severity::Info));
        tree.register("service.db", Some(Severity::Debug));
        tree.register("service.db.query", None);
        tree.register("service.http", Some(Severity::Warn));
        tree.register("a.b.c.D", None);
        let registry = LevelRegistry::create(tree.clone());
        (tree, registry)
    }

    #[test]
    fn test_effective_override_walk() {
        // Each row registers the override under one ancestor of a.b.c.D.
        for (key, expected) in [
            ("a.b.c.D", Some(Severity::Error)),
            ("a.b.c", Some(Severity::Error)),
            ("a.b", Some(Severity::Error)),
            ("a", Some(Severity::Error)),
            ("x.y.z", None),
        ] {
            let table = levels(&[(key, Severity::Error)]);
            assert_eq!(effective_override("a.b.c.D", &table), expected, "key {}", key);
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = levels(&[("a.b.c", Severity::Error), ("a", Severity::Debug)]);
        assert_eq!(effective_override("a.b.c.D", &table), Some(Severity::Error));
        assert_eq!(effective_override("a.b.c", &table), Some(Severity::Error));
        assert_eq!(effective_override("a.b", &table), Some(Severity::Debug));
        assert_eq!(effective_override("x.y.z", &table), None);
    }

    #[test]
    fn test_no_prefix_match_is_absent() {
        let table = levels(&[("a.b.c", Severity::Error)]);
        assert_eq!(effective_override("a.b", &table), None);
        assert_eq!(effective_override("a.bc", &table), None);
    }

    #[test]
    fn test_root_entry_is_terminal_ancestor() {
        let table = levels(&[(ROOT_LOGGER_NAME, Severity::Warn)]);
        assert_eq!(effective_override("x.y.z", &table), Some(Severity::Warn));
        assert_eq!(effective_override(ROOT_LOGGER_NAME, &table), Some(Severity::Warn));
        assert_eq!(effective_override("x", &HashMap::new()), None);
    }

    #[test]
    fn test_available_snapshot() {
        let (_, registry) = setup();
        assert_eq!(registry.available().get("service.db.query"), Some(&Severity::Debug));
        assert_eq!(registry.available().get("service"), Some(&Severity::Info));
        assert_eq!(registry.root_level(), Severity::Info);
    }

    #[test]
    fn test_apply_publishes_requested_levels() {
        let (_, registry) = setup();
        let outcome = registry.apply(&snapshot(&[("service.db", "ERROR")], &[("service", "DEBUG")]));

        assert_eq!(outcome.active, 1);
        assert_eq!(outcome.sampling, 1);
        assert!(outcome.skipped.is_empty());

        let decision = registry.get_log_decision("service.db.query");
        assert_eq!(decision.severity, Some(Severity::Error));
        assert_eq!(decision.sampling_severity, Some(Severity::Debug));

        let decision = registry.get_log_decision("other");
        assert_eq!(decision, LogDecision::default());
    }

    #[test]
    fn test_installed_level_is_clamped_to_baseline() {
        let (tree, registry) = setup();

        // Less verbose than baseline: native level keeps the baseline.
        registry.apply(&snapshot(&[("service.db", "ERROR")], &[]));
        assert_eq!(tree.native_level("service.db"), Some(Some(Severity::Debug)));
        assert_eq!(registry.baseline("service.db"), Some(Some(Severity::Debug)));

        // More verbose than baseline: override is installed.
        registry.apply(&snapshot(&[("service.db", "TRACE")], &[]));
        assert_eq!(tree.native_level("service.db"), Some(Some(Severity::Trace)));

        // Baseline is never replaced by an overridden value.
        registry.apply(&snapshot(&[("service.db", "WARN")], &[]));
        assert_eq!(registry.baseline("service.db"), Some(Some(Severity::Debug)));
        assert_eq!(tree.native_level("service.db"), Some(Some(Severity::Debug)));
    }

    #[test]
    fn test_inherited_baseline_uses_original_effective_level() {
        let (tree, registry) = setup();
        registry.apply(&snapshot(&[("service.db.query", "ERROR")], &[]));

        assert_eq!(registry.baseline("service.db.query"), Some(None));
        assert_eq!(tree.native_level("service.db.query"), Some(Some(Severity::Debug)));
    }

    #[test]
    fn test_removed_override_restores_baseline() {
        let (tree, registry) = setup();
        registry.apply(&snapshot(&[("service.db.query", "TRACE")], &[]));
        assert_eq!(tree.native_level("service.db.query"), Some(Some(Severity::Trace)));

        let outcome = registry.apply(&snapshot(&[], &[]));
        assert_eq!(outcome.restored, 1);
        assert_eq!(tree.native_level("service.db.query"), Some(None));
        assert_eq!(registry.get_log_decision("service.db.query"), LogDecision::default());
    }

    #[test]
    fn test_sampling_overrides_do_not_touch_native_levels() {
        let (tree, registry) = setup();
        registry.apply(&snapshot(&[], &[("service.http", "TRACE")]));

        assert_eq!(tree.native_level("service.http"), Some(Some(Severity::Warn)));
        assert_eq!(registry.baseline("service.http"), None);
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let (_, registry) = setup();
        let outcome = registry.apply(&snapshot(
            &[("service.db", "LOUD"), ("no.such.logger", "DEBUG"), ("service.http", "INFO")],
            &[("nowhere", "DEBUG")],
        ));

        assert_eq!(outcome.active, 1);
        assert_eq!(
            outcome.skipped,
            vec![
                DialError::UnknownSeverity("LOUD".into()),
                DialError::UnknownLogger("no.such.logger".into()),
                DialError::UnknownLogger("nowhere".into()),
            ]
        );
        assert_eq!(registry.get_log_decision("service.http").severity, Some(Severity::Info));
    }

    #[test]
    fn test_reapply_is_idempotent() {
        let (tree, registry) = setup();
        let snap = snapshot(&[("service.db", "TRACE"), ("service.http", "ERROR")], &[("service", "INFO")]);

        registry.apply(&snap);
        let first = registry.overrides();
        let native: Vec<_> = ["service.db", "service.http"].iter().map(|n| tree.native_level(n)).collect();

        registry.apply(&snap);
        assert_eq!(*registry.overrides(), *first);
        let again: Vec<_> = ["service.db", "service.http"].iter().map(|n| tree.native_level(n)).collect();
        assert_eq!(native, again);
    }

    #[test]
    fn test_root_override_by_name() {
        let (tree, registry) = setup();
        registry.apply(&snapshot(&[("ROOT", "DEBUG")], &[]));

        assert_eq!(registry.get_log_decision("unrelated.name").severity, Some(Severity::Debug));
        assert_eq!(tree.effective_level("unrelated.name"), Severity::Debug);
    }

    #[test]
    fn test_suppression_hook_follows_active_overrides() {
        let (tree, registry) = setup();

        registry.apply(&snapshot(&[("service.db", "ERROR")], &[]));
        assert!(!tree.accepts("service.db.query", Severity::Debug, SinkKind::Local));
        assert!(tree.accepts("service.db.query", Severity::Error, SinkKind::Local));
        // The export sink is never filtered by the hook.
        assert!(tree.accepts("service.db.query", Severity::Debug, SinkKind::Export));

        registry.apply(&snapshot(&[("service.http", "DEBUG")], &[]));
        assert!(tree.accepts("service.http", Severity::Debug, SinkKind::Local));
    }

    #[test]
    fn test_suppression_hook_falls_back_to_original_root() {
        let (tree, _registry) = setup();

        // service.db is natively DEBUG, but without an override the hook
        // compares against the original root level (INFO).
        assert!(!tree.passes_filter("service.db", Severity::Debug));
        assert!(!tree.accepts("service.db.query", Severity::Debug, SinkKind::Local));
        assert!(tree.passes_filter("service.db", Severity::Info));
        assert!(tree.accepts("service.db.query", Severity::Debug, SinkKind::Export));
    }

    #[test]
    fn test_suppression_hook_override_is_per_logger() {
        let (tree, registry) = setup();
        registry.apply(&snapshot(&[("service.http", "TRACE")], &[]));

        // An override on one logger does not lower the fallback for others.
        assert!(!tree.passes_filter("service.db", Severity::Debug));
        assert!(tree.passes_filter("service.http", Severity::Trace));
    }

    #[test]
    fn test_concurrent_readers_see_whole_override_pairs() {
        let (_, registry) = setup();
        let registry = Arc::new(registry);
        let loud = snapshot(&[("service.db", "ERROR")], &[("service.db", "ERROR")]);
        let quiet = snapshot(&[("service.db", "DEBUG")], &[("service.db", "DEBUG")]);
        registry.apply(&loud);

        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let writer = {
            let registry = registry.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut flip = false;
                while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                    registry.apply(if flip { &loud } else { &quiet });
                    flip = !flip;
                }
            })
        };

        for _ in 0..20_000 {
            let decision = registry.get_log_decision("service.db.query");
            assert!(decision.severity.is_some());
            assert_eq!(decision.severity, decision.sampling_severity);
        }

        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        writer.join().unwrap();
    }

    #[test]
    fn test_concurrent_first_touch_keeps_true_baseline() {
        let (tree, registry) = setup();
        let registry = Arc::new(registry);
        let snap = snapshot(&[("service.http", "TRACE")], &[]);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let snap = snap.clone();
                std::thread::spawn(move || {
                    registry.apply(&snap);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(registry.baseline("service.http"), Some(Some(Severity::Warn)));
        assert_eq!(tree.native_level("service.http"), Some(Some(Severity::Trace)));
    }
}
