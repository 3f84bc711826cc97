//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the logger tree from the local baseline levels
//! - Initialize the sampler and the control source
//! - Start background tasks (control loop, payload watcher, admin API)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The registry is created by the caller once every logger is registered,
//!   so logging can be wired to it before background tasks start

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use crate::admin::{self, AdminState};
use crate::config::watcher::ConfigWatcher;
use crate::config::{AgentConfig, SourceKind};
use crate::control::source::{self, ConfigSource, FileSource};
use crate::control::{ControlLoop, LoopStateHandle};
use crate::error::DialError;
use crate::levels::{LevelRegistry, LoggerTree, Severity};
use crate::lifecycle::shutdown::Shutdown;
use crate::sampling::DynamicSampler;

/// Loggers this crate emits under.
const OWN_LOGGERS: &[&str] = &[
    "telemetry_dial.control.control_loop",
    "telemetry_dial.levels.registry",
    "telemetry_dial.config.watcher",
    "telemetry_dial.admin",
];

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Dial(#[from] DialError),

    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("admin listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the in-process logger tree from the local configuration.
pub fn build_logger_tree(config: &AgentConfig) -> Result<LoggerTree, DialError> {
    let root: Severity = config.observability.log_level.parse()?;
    let tree = LoggerTree::new(root);
    for name in OWN_LOGGERS {
        tree.register(name, None);
    }
    for (logger, level) in &config.loggers {
        let level: Severity = level.parse()?;
        tree.register(crate::levels::backend::normalize_logger_name(logger), Some(level));
    }
    Ok(tree)
}

/// A running agent: control loop plus optional admin API.
pub struct Agent {
    pub registry: Arc<LevelRegistry>,
    pub sampler: Arc<DynamicSampler>,
    loop_state: LoopStateHandle,
    admin_addr: Option<SocketAddr>,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
    _watcher: Option<notify::RecommendedWatcher>,
}

impl Agent {
    /// Start background tasks for `config` against an existing registry.
    pub async fn start(config: &AgentConfig, registry: Arc<LevelRegistry>) -> Result<Self, StartupError> {
        let sampler = Arc::new(DynamicSampler::new(config.control.initial_sample_ratio)?);
        let control_source: Arc<dyn ConfigSource> = Arc::from(source::from_config(&config.control)?);
        let shutdown = Shutdown::new();
        let mut tasks = Vec::new();

        let mut control = ControlLoop::new(
            control_source,
            registry.clone(),
            sampler.clone(),
            Duration::from_secs(config.control.poll_interval_secs.max(1)),
        )
        .with_identity(config.service_name.clone(), config.instance_id.clone());

        let mut watcher = None;
        if config.control.source == SourceKind::File && config.control.watch {
            if let Some(path) = config.control.path.as_deref() {
                let file = FileSource::new(path);
                let (payload_watcher, wake_rx) = ConfigWatcher::new(file.path());
                watcher = Some(payload_watcher.run()?);
                control = control.with_wake(wake_rx);
            }
        }

        let loop_state = control.state_handle();
        tasks.push(tokio::spawn(control.run(shutdown.subscribe())));

        let mut admin_addr = None;
        if config.admin.enabled {
            let listener = TcpListener::bind(&config.admin.bind_address).await?;
            admin_addr = Some(listener.local_addr()?);
            let state = AdminState {
                registry: registry.clone(),
                sampler: sampler.clone(),
                loop_state: loop_state.clone(),
                api_key: Arc::from(config.admin.api_key.as_str()),
            };
            let admin_shutdown = shutdown.subscribe();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = admin::serve(listener, state, admin_shutdown).await {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            }));
        }

        tracing::info!(
            service_name = %config.service_name,
            instance_id = %config.instance_id,
            sampler = %sampler,
            "Agent started"
        );

        Ok(Self {
            registry,
            sampler,
            loop_state,
            admin_addr,
            shutdown,
            tasks,
            _watcher: watcher,
        })
    }

    pub fn loop_state(&self) -> LoopStateHandle {
        self.loop_state.clone()
    }

    /// Address the admin API is bound to, when enabled.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    /// Signal every task and wait up to `timeout` for them to finish.
    pub async fn stop(self, timeout: Duration) {
        self.shutdown.trigger();
        for task in self.tasks {
            let abort = task.abort_handle();
            if tokio::time::timeout(timeout, task).await.is_err() {
                tracing::warn!("Task did not stop before the deadline, aborting");
                abort.abort();
            }
        }
        tracing::info!("Agent stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::LoggerBackend;

    #[test]
    fn test_build_logger_tree() {
        let mut config = AgentConfig::default();
        config.observability.log_level = "warn".to_string();
        config.loggers.insert("service.db".to_string(), "debug".to_string());
        config.loggers.insert("ROOT".to_string(), "error".to_string());

        let tree = build_logger_tree(&config).unwrap();
        assert_eq!(tree.effective_level("service.db.query"), Severity::Debug);
        assert_eq!(tree.effective_level("service"), Severity::Error);
        assert!(tree.native_level("telemetry_dial.control").is_some());
    }

    #[test]
    fn test_build_logger_tree_rejects_bad_level() {
        let mut config = AgentConfig::default();
        config.loggers.insert("a".to_string(), "LOUD".to_string());
        assert!(matches!(build_logger_tree(&config), Err(DialError::UnknownSeverity(_))));
    }

    #[tokio::test]
    async fn test_start_and_stop_with_file_source() {
        let path = std::env::temp_dir().join(format!("dial-agent-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"sampleRatio": 0.2}"#).unwrap();

        let mut config = AgentConfig::default();
        config.control.source = SourceKind::File;
        config.control.path = Some(path.display().to_string());
        config.control.watch = false;

        let tree = Arc::new(build_logger_tree(&config).unwrap());
        let registry = Arc::new(LevelRegistry::create(tree));
        let agent = Agent::start(&config, registry).await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(agent.sampler.ratio(), 0.2);

        let state = agent.loop_state();
        agent.stop(Duration::from_secs(1)).await;
        assert_eq!(state.get(), crate::control::LoopState::Stopped);

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
