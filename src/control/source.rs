//! Configuration sources.
//!
//! # Responsibilities
//! - Return the raw snapshot payload on demand
//! - Turn every transport failure into `DialError::Transport`
//!
//! # Design Decisions
//! - The HTTP source reports the agent's effective config in the request body;
//!   the response maps service names to snapshots so one endpoint serves many
//!   services
//! - The file source re-reads the whole file each cycle

use std::path::{Path, PathBuf};
use std::time::Duration;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use url::Url;
use crate::config::{ControlConfig, SourceKind};
use crate::control::snapshot::{ConfigSnapshot, PayloadFormat, PayloadLayout};
use crate::error::{DialError, DialResult};

/// What the agent tells the control endpoint about itself each cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReport {
    pub service_name: String,
    pub instance_id: String,
    /// Last applied snapshot with `availableLoggers` filled in.
    pub effective_config: ConfigSnapshot,
}

/// A transport able to produce a snapshot payload.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Fetch the current payload bytes.
    async fn fetch(&self, report: &AgentReport) -> DialResult<Vec<u8>>;

    /// Encoding of the payloads this source returns.
    fn format(&self) -> PayloadFormat;

    /// Whether payloads carry one snapshot or one per service.
    fn layout(&self) -> PayloadLayout {
        PayloadLayout::Single
    }

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// Polls an HTTP control endpoint.
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSource {
    pub fn new(endpoint: &str, timeout: Duration) -> DialResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| DialError::Transport(format!("invalid endpoint {}: {}", endpoint, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DialError::Transport(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ConfigSource for HttpSource {
    async fn fetch(&self, report: &AgentReport) -> DialResult<Vec<u8>> {
        let response = self.client
            .post(self.endpoint.clone())
            .json(report)
            .send()
            .await
            .map_err(|e| DialError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DialError::Transport(format!("control endpoint returned {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DialError::Transport(e.to_string()))?;
        if body.is_empty() {
            return Err(DialError::Transport("control endpoint returned no body".to_string()));
        }
        Ok(body.to_vec())
    }

    fn format(&self) -> PayloadFormat {
        PayloadFormat::Json
    }

    fn layout(&self) -> PayloadLayout {
        PayloadLayout::PerService
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}

/// Reads the snapshot from a local file.
pub struct FileSource {
    path: PathBuf,
    format: PayloadFormat,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = PayloadFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    async fn fetch(&self, _report: &AgentReport) -> DialResult<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| DialError::Transport(format!("{}: {}", self.path.display(), e)))
    }

    fn format(&self) -> PayloadFormat {
        self.format
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Build the source selected in the agent configuration.
pub fn from_config(config: &ControlConfig) -> DialResult<Box<dyn ConfigSource>> {
    match config.source {
        SourceKind::Http => Ok(Box::new(HttpSource::new(
            &config.endpoint,
            Duration::from_secs(config.request_timeout_secs),
        )?)),
        SourceKind::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| DialError::Transport("file source has no path".to_string()))?;
            Ok(Box::new(FileSource::new(path)))
        }
    }
}
