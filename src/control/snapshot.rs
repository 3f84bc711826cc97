//! Configuration snapshot delivered by the control endpoint.
//!
//! Field names follow the wire shape (`logLevels`, `samplingLogLevels`,
//! `sampleRatio`, `availableLoggers`).

use std::collections::BTreeMap;
use serde::{Deserialize, Deserializer, Serialize};
use crate::error::{DialError, DialResult};
use crate::levels::Severity;

/// One `{logger, level}` override entry. The level stays a raw string so a
/// single bad entry can be skipped without rejecting the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLevelEntry {
    pub logger: String,
    pub level: String,
}

impl LogLevelEntry {
    pub fn new(logger: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
            level: level.into(),
        }
    }
}

/// Parsed configuration, applied once and then discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigSnapshot {
    #[serde(deserialize_with = "null_as_empty")]
    pub log_levels: Vec<LogLevelEntry>,

    #[serde(deserialize_with = "null_as_empty")]
    pub sampling_log_levels: Vec<LogLevelEntry>,

    /// Absent means "keep the current ratio".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_ratio: Option<f64>,

    /// Report-only inventory sent upstream; ignored when applying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_loggers: Option<BTreeMap<String, Severity>>,
}

/// How snapshots are laid out inside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLayout {
    /// The payload is this service's snapshot.
    Single,
    /// The payload maps service names to snapshots.
    PerService,
}

/// Encoding of a snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Toml,
}

impl PayloadFormat {
    /// Pick a format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => PayloadFormat::Toml,
            _ => PayloadFormat::Json,
        }
    }
}

impl ConfigSnapshot {
    /// Decode a payload. An empty payload is an empty snapshot.
    pub fn parse(bytes: &[u8], format: PayloadFormat) -> DialResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match format {
            PayloadFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| DialError::Parse(e.to_string()))
            }
            PayloadFormat::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| DialError::Parse(e.to_string()))?;
                toml::from_str(text).map_err(|e| DialError::Parse(e.to_string()))
            }
        }
    }
}

impl ConfigSnapshot {
    /// Decode a service-keyed payload and pick the entry for `service`.
    ///
    /// A missing entry yields an empty snapshot, which clears every override
    /// and keeps the current ratio.
    pub fn parse_for_service(bytes: &[u8], format: PayloadFormat, service: &str) -> DialResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let mut by_service: BTreeMap<String, ConfigSnapshot> = match format {
            PayloadFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| DialError::Parse(e.to_string()))?
            }
            PayloadFormat::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| DialError::Parse(e.to_string()))?;
                toml::from_str(text).map_err(|e| DialError::Parse(e.to_string()))?
            }
        };
        match by_service.remove(service) {
            Some(snapshot) => Ok(snapshot),
            None => {
                tracing::debug!(service, services = by_service.len(), "No snapshot for this service");
                Ok(Self::default())
            }
        }
    }

    /// Decode a payload with the given layout.
    pub fn decode(bytes: &[u8], format: PayloadFormat, layout: PayloadLayout, service: &str) -> DialResult<Self> {
        match layout {
            PayloadLayout::Single => Self::parse(bytes, format),
            PayloadLayout::PerService => Self::parse_for_service(bytes, format, service),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<LogLevelEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<LogLevelEntry>>::deserialize(deserializer)?.unwrap_or_default())
}
