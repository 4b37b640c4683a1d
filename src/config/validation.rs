//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, ceiling > 0, body limits)
//! - Validate CORS origin patterns and metrics address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LauncherConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::LauncherConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &LauncherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::new("server.host", "must not be empty"));
    }
    if config.server.environment.trim().is_empty() {
        errors.push(ValidationError::new("server.environment", "must not be empty"));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }

    if config.paths.roms_dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("paths.roms_dir", "must not be empty"));
    }
    if config.paths.db_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("paths.db_path", "must not be empty"));
    }

    if config.security.max_body_bytes == 0 {
        errors.push(ValidationError::new("security.max_body_bytes", "must be greater than 0"));
    }
    for origin in &config.security.cors_origins {
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            errors.push(ValidationError::new(
                "security.cors_origins",
                format!("{origin:?} must start with http:// or https://"),
            ));
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.window_ms == 0 {
            errors.push(ValidationError::new("rate_limit.window_ms", "must be greater than 0"));
        }
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
