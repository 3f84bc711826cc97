//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Agent config → logger tree → registry + sampler → control loop → admin API
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → control loop and admin API exit → join
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: tree first, registry snapshot second, background tasks last
//! - Shutdown has timeout: tasks still running after the deadline are aborted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_logger_tree, Agent, StartupError};
