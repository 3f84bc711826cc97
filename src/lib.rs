//! Runtime telemetry control plane.
//!
//! Periodically fetches a configuration snapshot from a control endpoint and
//! applies it to per-logger verbosity and the trace-sampling ratio of the
//! running process.

pub mod config;
pub mod control;
pub mod error;
pub mod gate;
pub mod levels;
pub mod sampling;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::schema::AgentConfig;
pub use error::{DialError, DialResult};
pub use lifecycle::{Agent, Shutdown};
