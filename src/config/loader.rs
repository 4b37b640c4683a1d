//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::LauncherConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {key}")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<LauncherConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => LauncherConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML config file without validating it.
pub fn load_file(path: &Path) -> Result<LauncherConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut LauncherConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("PORT") {
        config.server.port = parse_env("PORT", &v)?;
    }
    if let Some(v) = get("HOST") {
        config.server.host = v;
    }
    if let Some(v) = get("APP_ENV") {
        config.server.environment = v;
    }
    if let Some(v) = get("ROMS_DIR") {
        config.paths.roms_dir = PathBuf::from(v);
    }
    if let Some(v) = get("PUBLIC_DIR") {
        config.paths.public_dir = PathBuf::from(v);
    }
    if let Some(v) = get("DB_PATH") {
        config.paths.db_path = PathBuf::from(v);
    }
    if let Some(v) = get("CORS_ORIGIN") {
        config.security.cors_origins = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(v) = get("RATE_LIMIT_WINDOW_MS") {
        config.rate_limit.window_ms = parse_env("RATE_LIMIT_WINDOW_MS", &v)?;
    }
    if let Some(v) = get("RATE_LIMIT_MAX") {
        config.rate_limit.max_requests = parse_env("RATE_LIMIT_MAX", &v)?;
    }
    if let Some(v) = get("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = get("LOG_FORMAT") {
        config.observability.log_format = v;
    }

    Ok(())
}

fn parse_env<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        key,
        value: value.to_string(),
    })
}
