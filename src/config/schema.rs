//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the launcher.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the launcher server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LauncherConfig {
    /// Listener and environment settings.
    pub server: ServerConfig,

    /// Filesystem locations.
    pub paths: PathsConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Per-address rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl LauncherConfig {
    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// Listening port.
    pub port: u16,

    /// Environment tag (development, production, ...).
    pub environment: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the `.gba` files.
    pub roms_dir: PathBuf,

    /// Front-end bundle directory.
    pub public_dir: PathBuf,

    /// SQLite event database.
    pub db_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            roms_dir: PathBuf::from("data/roms"),
            public_dir: PathBuf::from("public"),
            db_path: PathBuf::from("data.sqlite"),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Allowed CORS origins. A trailing `:*` matches any (or no) port.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Maximum JSON nesting depth for request bodies.
    pub max_body_depth: usize,

    /// Add security response headers.
    pub security_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![
                "http://localhost:*".to_string(),
                "http://127.0.0.1:*".to_string(),
            ],
            max_body_bytes: 10 * 1024 * 1024, // 10MB
            max_body_depth: 5,
            security_headers: true,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Sliding window length in milliseconds.
    pub window_ms: u64,

    /// Requests allowed per address within one window.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 15 * 60 * 1000, // 15 minutes
            max_requests: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format: "pretty", "json", or empty to pick by environment.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: String::new(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
