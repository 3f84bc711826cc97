//! Configuration schema definitions.
//!
//! This module defines the local agent configuration. All types derive Serde
//! traits for deserialization from TOML files.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Root configuration for the telemetry dial agent.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Service name reported upstream; picks this service's entry from the
    /// control endpoint's per-service response.
    pub service_name: String,

    /// Unique ID of this process. Defaults to a random UUID.
    pub instance_id: String,

    /// Control endpoint and polling settings.
    pub control: ControlConfig,

    /// Local logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Baseline logger levels set by the local operator (name → level).
    pub loggers: BTreeMap<String, String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown_service".to_string(),
            instance_id: uuid::Uuid::new_v4().to_string(),
            control: ControlConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
            loggers: BTreeMap::new(),
        }
    }
}

/// Where configuration snapshots come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// POST the effective config to `endpoint`, apply the response.
    Http,
    /// Read `path` (JSON or TOML by extension).
    File,
}

/// Control loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    pub source: SourceKind,

    /// Control endpoint URL for the HTTP source.
    pub endpoint: String,

    /// Payload file for the file source.
    pub path: Option<String>,

    /// Poll interval in seconds.
    pub poll_interval_secs: u64,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Sample ratio in effect before the first snapshot arrives.
    pub initial_sample_ratio: f64,

    /// Wake the loop on file change notifications (file source only).
    pub watch: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Http,
            endpoint: "http://localhost:12345/api/v0/debugdial".to_string(),
            path: None,
            poll_interval_secs: 10,
            request_timeout_secs: 5,
            initial_sample_ratio: 1.0,
            watch: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Root log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// File receiving the JSON export stream. Disabled when unset.
    pub export_path: Option<String>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            export_path: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
