//! Local agent configuration.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AgentConfig (validated, immutable)
//!     → wires the logger tree, sampler, control source and admin API
//!
//! File source only:
//!     watcher.rs detects a payload change
//!     → wake-up sent to the control loop
//!     → out-of-band fetch/parse/apply cycle
//! ```
//!
//! # Design Decisions
//! - Agent config is read once at startup; remote snapshots are the dynamic part
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AgentConfig;
pub use schema::AdminConfig;
pub use schema::ControlConfig;
pub use schema::ObservabilityConfig;
pub use schema::SourceKind;
