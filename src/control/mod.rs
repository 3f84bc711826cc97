//! Remote configuration control plane.
//!
//! # Data Flow
//! ```text
//! ticker / wake-up
//!     → source.rs (HTTP POST of the effective config, or file read)
//!     → snapshot.rs (decode payload into ConfigSnapshot)
//!     → LevelRegistry::apply (override pair swap, native levels)
//!     → DynamicSampler::set_ratio (validated, previous kept on error)
//! ```
//!
//! # Design Decisions
//! - Transport and parse failures skip the cycle; no immediate retry
//! - Nothing readers depend on is locked while fetching

pub mod control_loop;
pub mod snapshot;
pub mod source;

pub use control_loop::{ControlLoop, LoopState, LoopStateHandle};
pub use snapshot::{ConfigSnapshot, LogLevelEntry, PayloadFormat, PayloadLayout};
pub use source::{AgentReport, ConfigSource, FileSource, HttpSource};
