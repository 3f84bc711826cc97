//! Poll/apply control loop.
//!
//! # States
//! ```text
//! Idle → Fetching → Applying → Idle ...
//! any state → Stopped (shutdown signal)
//! ```
//!
//! # Design Decisions
//! - One cycle runs immediately at start, then one per interval tick
//! - A wake-up (file change) triggers an extra cycle without resetting the ticker
//! - Failed cycles are logged and skipped; the next tick retries
//! - I/O happens before any shared state is touched; commit is two atomic stores

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};
use crate::control::snapshot::ConfigSnapshot;
use crate::control::source::{AgentReport, ConfigSource};
use crate::error::DialResult;
use crate::levels::{ApplyOutcome, LevelRegistry};
use crate::observability::metrics;
use crate::sampling::DynamicSampler;

/// Control loop state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Idle = 0,
    Fetching = 1,
    Applying = 2,
    Stopped = 3,
}

impl From<u8> for LoopState {
    fn from(val: u8) -> Self {
        match val {
            1 => LoopState::Fetching,
            2 => LoopState::Applying,
            3 => LoopState::Stopped,
            _ => LoopState::Idle,
        }
    }
}

/// Read-only view of a running loop's state.
#[derive(Debug, Clone)]
pub struct LoopStateHandle(Arc<AtomicU8>);

impl LoopStateHandle {
    pub fn get(&self) -> LoopState {
        LoopState::from(self.0.load(Ordering::Acquire))
    }
}

/// Shortest poll interval; tokio intervals cannot be zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Fetches snapshots and commits them to the registry and sampler.
pub struct ControlLoop {
    source: Arc<dyn ConfigSource>,
    registry: Arc<LevelRegistry>,
    sampler: Arc<DynamicSampler>,
    interval: Duration,
    service_name: String,
    instance_id: String,
    wake: Option<mpsc::Receiver<()>>,
    state: Arc<AtomicU8>,
    last_applied: ConfigSnapshot,
}

impl ControlLoop {
    /// Create a loop polling every `interval`, raised to at least 1ms.
    pub fn new(
        source: Arc<dyn ConfigSource>,
        registry: Arc<LevelRegistry>,
        sampler: Arc<DynamicSampler>,
        interval: Duration,
    ) -> Self {
        let last_applied = ConfigSnapshot {
            sample_ratio: Some(sampler.ratio()),
            ..Default::default()
        };
        Self {
            source,
            registry,
            sampler,
            interval: interval.max(MIN_INTERVAL),
            service_name: "unknown_service".to_string(),
            instance_id: String::new(),
            wake: None,
            state: Arc::new(AtomicU8::new(LoopState::Idle as u8)),
            last_applied,
        }
    }

    /// Identity reported upstream on every cycle.
    pub fn with_identity(mut self, service_name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self.instance_id = instance_id.into();
        self
    }

    /// Extra cycles are run whenever a signal arrives on `wake`.
    pub fn with_wake(mut self, wake: mpsc::Receiver<()>) -> Self {
        self.wake = Some(wake);
        self
    }

    pub fn state_handle(&self) -> LoopStateHandle {
        LoopStateHandle(self.state.clone())
    }

    /// Run until the shutdown signal fires. In-flight fetches are abandoned.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            source = %self.source.describe(),
            interval_secs = self.interval.as_secs_f64(),
            "Control loop starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {}
                wake = recv_wake(&mut self.wake) => {
                    if wake.is_none() {
                        tracing::debug!("Wake-up channel closed, polling on interval only");
                        self.wake = None;
                        continue;
                    }
                    tracing::debug!("Wake-up received, running out-of-band cycle");
                }
            }

            tokio::select! {
                result = self.run_cycle() => {
                    if let Err(e) = result {
                        tracing::warn!(
                            error = %e,
                            kind = e.kind(),
                            "Control cycle failed, waiting for next tick"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown during control cycle, abandoning fetch");
                    break;
                }
            }
        }

        self.set_state(LoopState::Stopped);
        tracing::info!("Control loop received shutdown signal, exiting loop");
    }

    /// One fetch → parse → apply pass.
    pub async fn run_cycle(&mut self) -> DialResult<ApplyOutcome> {
        self.set_state(LoopState::Fetching);
        let report = self.report();
        let fetched = self.source.fetch(&report).await;

        let result = fetched
            .and_then(|bytes| {
                ConfigSnapshot::decode(&bytes, self.source.format(), self.source.layout(), &self.service_name)
            })
            .map(|snapshot| {
                self.set_state(LoopState::Applying);
                self.apply(snapshot)
            });

        match &result {
            Ok(_) => metrics::record_cycle("applied"),
            Err(e) => metrics::record_cycle(e.kind()),
        }
        self.set_state(LoopState::Idle);
        result
    }

    fn apply(&mut self, mut snapshot: ConfigSnapshot) -> ApplyOutcome {
        let mut outcome = self.registry.apply(&snapshot);

        if let Some(ratio) = snapshot.sample_ratio {
            match self.sampler.set_ratio(ratio) {
                Ok(()) => {
                    metrics::record_sample_ratio(ratio);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        previous = self.sampler.ratio(),
                        "Rejected sample ratio, keeping previous"
                    );
                    outcome.skipped.push(e);
                }
            }
        }

        tracing::info!(
            active = outcome.active,
            sampling = outcome.sampling,
            restored = outcome.restored,
            skipped = outcome.skipped.len(),
            sampler = %self.sampler,
            "Applied configuration snapshot"
        );

        snapshot.sample_ratio = Some(self.sampler.ratio());
        snapshot.available_loggers = None;
        self.last_applied = snapshot;
        outcome
    }

    fn report(&self) -> AgentReport {
        AgentReport {
            service_name: self.service_name.clone(),
            instance_id: self.instance_id.clone(),
            effective_config: ConfigSnapshot {
                available_loggers: Some(self.registry.available().clone()),
                ..self.last_applied.clone()
            },
        }
    }

    fn set_state(&self, state: LoopState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

async fn recv_wake(wake: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match wake {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
