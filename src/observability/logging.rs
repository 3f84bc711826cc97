//! Structured logging wired to the logger tree.
//!
//! Every tracing event is mapped onto a logger name (`a::b` becomes `a.b`)
//! and routed through two sinks:
//!
//! - console: tree levels plus the registry's suppression hook
//! - export (optional JSON file): tree levels plus the record gate
//!
//! Callsite interest is always `sometimes`, so a level change published by
//! the control loop applies to the very next event.

use std::fs::{File, OpenOptions};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::subscriber::Interest;
use tracing::{Level, Metadata};
use tracing_subscriber::layer::{Context, Filter, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::Layer;
use crate::config::ObservabilityConfig;
use crate::gate::{CurrentTrace, LogRecord, RecordGate};
use crate::levels::{LevelRegistry, LoggerTree, Severity, SinkKind};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("subscriber already installed: {0}")]
    Init(#[from] TryInitError),
}

/// Map a tracing target onto a dotted logger name.
pub fn target_to_logger(target: &str) -> String {
    target.replace("::", ".")
}

/// Console sink filter.
#[derive(Clone)]
pub struct ConsoleFilter {
    tree: Arc<LoggerTree>,
}

impl ConsoleFilter {
    pub fn new(tree: Arc<LoggerTree>) -> Self {
        Self { tree }
    }

    pub fn permits(&self, target: &str, level: &Level) -> bool {
        self.tree
            .accepts(&target_to_logger(target), Severity::from(level), SinkKind::Local)
    }
}

impl<S> Filter<S> for ConsoleFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        !meta.is_event() || self.permits(meta.target(), meta.level())
    }

    fn callsite_enabled(&self, _meta: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }
}

/// Export sink filter.
#[derive(Clone)]
pub struct ExportFilter {
    tree: Arc<LoggerTree>,
    gate: Arc<RecordGate<CurrentTrace>>,
}

impl ExportFilter {
    pub fn new(tree: Arc<LoggerTree>, registry: Arc<LevelRegistry>) -> Self {
        Self {
            tree,
            gate: Arc::new(RecordGate::new(registry, CurrentTrace)),
        }
    }

    pub fn permits(&self, target: &str, level: &Level) -> bool {
        let logger = target_to_logger(target);
        let severity = Severity::from(level);
        self.tree.accepts(&logger, severity, SinkKind::Export)
            && self.gate.admit(&LogRecord::new(&logger, severity))
    }
}

impl<S> Filter<S> for ExportFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        !meta.is_event() || self.permits(meta.target(), meta.level())
    }

    fn callsite_enabled(&self, _meta: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }
}

/// Install the global subscriber.
pub fn init_logging(
    config: &ObservabilityConfig,
    tree: Arc<LoggerTree>,
    registry: Arc<LevelRegistry>,
) -> Result<(), LoggingError> {
    let console = tracing_subscriber::fmt::layer().with_filter(ConsoleFilter::new(tree.clone()));

    let export = match config.export_path.as_deref() {
        Some(path) => {
            let file: File = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file))
                    .with_filter(ExportFilter::new(tree, registry)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(export)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing_subscriber::fmt::MakeWriter;
    use crate::control::snapshot::{ConfigSnapshot, LogLevelEntry};
    use crate::gate::TraceScope;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn setup() -> (Arc<LoggerTree>, Arc<LevelRegistry>) {
        let tree = Arc::new(LoggerTree::new(Severity::Info));
        tree.register("service.db", Some(Severity::Debug));
        tree.register("service.web", None);
        let registry = Arc::new(LevelRegistry::create(tree.clone()));
        (tree, registry)
    }

    fn apply(registry: &LevelRegistry, log: &[(&str, &str)], sampling: &[(&str, &str)]) {
        registry.apply(&ConfigSnapshot {
            log_levels: log.iter().map(|(l, s)| LogLevelEntry::new(*l, *s)).collect(),
            sampling_log_levels: sampling.iter().map(|(l, s)| LogLevelEntry::new(*l, *s)).collect(),
            ..Default::default()
        });
    }

    #[test]
    fn test_target_to_logger() {
        assert_eq!(target_to_logger("service::db::query"), "service.db.query");
        assert_eq!(target_to_logger("plain"), "plain");
    }

    #[test]
    fn test_console_follows_tree_levels() {
        let (tree, _registry) = setup();
        let console = ConsoleFilter::new(tree);

        assert!(!console.permits("service::web", &Level::DEBUG));
        assert!(console.permits("service::web", &Level::INFO));
        // Natively DEBUG, but held to the original root level by the hook.
        assert!(!console.permits("service::db", &Level::DEBUG));
        assert!(console.permits("service::db", &Level::INFO));
    }

    #[test]
    fn test_console_respects_suppression_hook() {
        let (tree, registry) = setup();
        let console = ConsoleFilter::new(tree);

        apply(&registry, &[("service.db", "ERROR")], &[]);
        assert!(!console.permits("service::db", &Level::WARN));
        assert!(console.permits("service::db", &Level::ERROR));

        apply(&registry, &[("service.db", "DEBUG")], &[]);
        assert!(console.permits("service::db", &Level::DEBUG));

        apply(&registry, &[], &[]);
        assert!(!console.permits("service::db", &Level::DEBUG));
        assert!(console.permits("service::db", &Level::INFO));
    }

    #[test]
    fn test_export_follows_overrides_and_sampling() {
        let (tree, registry) = setup();
        let export = ExportFilter::new(tree, registry.clone());

        apply(&registry, &[("service.web", "TRACE")], &[("service.web", "DEBUG")]);

        assert!(!export.permits("service::web", &Level::DEBUG));
        {
            let _scope = TraceScope::enter(true);
            assert!(export.permits("service::web", &Level::DEBUG));
            assert!(export.permits("service::web", &Level::TRACE));
        }
        assert!(export.permits("service::web", &Level::INFO));
    }

    #[test]
    fn test_layers_filter_events() {
        let (tree, registry) = setup();
        let console_out = Capture::default();
        let export_out = Capture::default();

        let subscriber = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(console_out.clone())
                    .with_ansi(false)
                    .with_filter(ConsoleFilter::new(tree.clone())),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(export_out.clone())
                    .with_filter(ExportFilter::new(tree, registry.clone())),
            );

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "service::web", "before override");
            apply(&registry, &[("service.web", "DEBUG")], &[("service.web", "DEBUG")]);
            tracing::debug!(target: "service::web", "dropped when unsampled");
            let _scope = TraceScope::enter(true);
            tracing::debug!(target: "service::web", "kept for sampled trace");
        });

        let console = console_out.contents();
        let export = export_out.contents();
        assert!(!console.contains("before override"));
        assert!(!export.contains("before override"));
        assert!(console.contains("dropped when unsampled"));
        assert!(!export.contains("dropped when unsampled"));
        assert!(console.contains("kept for sampled trace"));
        assert!(export.contains("kept for sampled trace"));
    }
}
