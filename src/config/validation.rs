//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the chosen source has what it needs (URL or path)
//! - Validate value ranges (interval > 0, ratio in [0, 1])
//! - Check baseline logger levels parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AgentConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;
use crate::config::schema::{AgentConfig, SourceKind};
use crate::levels::Severity;

/// A single semantic problem in the agent configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("control.endpoint is not an http(s) URL: {0}")]
    InvalidEndpoint(String),

    #[error("control.path is required for the file source")]
    MissingPath,

    #[error("control.poll_interval_secs must be greater than 0")]
    ZeroPollInterval,

    #[error("control.request_timeout_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("control.initial_sample_ratio must be in [0.0, 1.0], got {0}")]
    InvalidSampleRatio(f64),

    #[error("invalid level '{level}' for {field}")]
    InvalidLevel { field: String, level: String },

    #[error("admin.api_key must not be empty when the admin API is enabled")]
    EmptyApiKey,
}

/// Validate an agent configuration.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let control = &config.control;

    match control.source {
        SourceKind::Http => {
            let valid = Url::parse(&control.endpoint)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !valid {
                errors.push(ValidationError::InvalidEndpoint(control.endpoint.clone()));
            }
        }
        SourceKind::File => {
            if control.path.as_deref().map_or(true, str::is_empty) {
                errors.push(ValidationError::MissingPath);
            }
        }
    }

    if control.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }
    if control.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if !(0.0..=1.0).contains(&control.initial_sample_ratio) {
        errors.push(ValidationError::InvalidSampleRatio(control.initial_sample_ratio));
    }

    if config.observability.log_level.parse::<Severity>().is_err() {
        errors.push(ValidationError::InvalidLevel {
            field: "observability.log_level".to_string(),
            level: config.observability.log_level.clone(),
        });
    }
    for (logger, level) in &config.loggers {
        if level.parse::<Severity>().is_err() {
            errors.push(ValidationError::InvalidLevel {
                field: format!("loggers.{}", logger),
                level: level.clone(),
            });
        }
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::EmptyApiKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
