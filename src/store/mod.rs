//! Event log storage subsystem.
//!
//! # Data Flow
//! ```text
//! accepted play        → event_log.rs (EventLog::record_play, never fails)
//! rejected request     → event_log.rs (EventLog::record_security_event, fire-and-forget)
//!                            → EventStore (sqlite.rs | memory.rs)
//! GET /api/rom-stats   → EventStore::play_stats (aggregate)
//! ```
//!
//! # Design Decisions
//! - Two append-only relations; no update or delete path exists
//! - Every operation returns `Result`, the never-fail policy lives in `EventLog`
//! - Timestamps are server-assigned UTC

pub mod event_log;
pub mod memory;
pub mod sqlite;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::roms::{RejectReason, RomName};

pub use event_log::EventLog;
pub use memory::MemoryEventStore;
pub use sqlite::SqliteEventStore;

/// Errors from event store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("store is closed")]
    Closed,

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Tag attached to a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventKind {
    InvalidLength,
    PathTraversal,
    InvalidCharacters,
    InvalidName,
    InvalidRequestFormat,
    RequestTooComplex,
    MalformedBody,
    PayloadTooLarge,
    RateLimited,
    NotFound,
    HttpError,
    RomPlayLogError,
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidLength => "invalid_length",
            Self::PathTraversal => "path_traversal",
            Self::InvalidCharacters => "invalid_characters",
            Self::InvalidName => "invalid_name",
            Self::InvalidRequestFormat => "invalid_request_format",
            Self::RequestTooComplex => "request_too_complex",
            Self::MalformedBody => "malformed_body",
            Self::PayloadTooLarge => "payload_too_large",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::HttpError => "http_error",
            Self::RomPlayLogError => "rom_play_log_error",
        }
    }
}

impl From<RejectReason> for SecurityEventKind {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::InvalidLength => Self::InvalidLength,
            RejectReason::PathTraversal => Self::PathTraversal,
            RejectReason::InvalidCharacters => Self::InvalidCharacters,
            RejectReason::InvalidName => Self::InvalidName,
        }
    }
}

impl FromStr for SecurityEventKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "invalid_length" => Self::InvalidLength,
            "path_traversal" => Self::PathTraversal,
            "invalid_characters" => Self::InvalidCharacters,
            "invalid_name" => Self::InvalidName,
            "invalid_request_format" => Self::InvalidRequestFormat,
            "request_too_complex" => Self::RequestTooComplex,
            "malformed_body" => Self::MalformedBody,
            "payload_too_large" => Self::PayloadTooLarge,
            "rate_limited" => Self::RateLimited,
            "not_found" => Self::NotFound,
            "http_error" => Self::HttpError,
            "rom_play_log_error" => Self::RomPlayLogError,
            other => return Err(StoreError::Corrupt(format!("unknown event type {other:?}"))),
        })
    }
}

impl fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayEvent {
    pub id: i64,
    pub rom_name: String,
    pub played_at: DateTime<Utc>,
}

/// One rejected or flagged request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityEvent {
    pub id: i64,
    pub event_type: SecurityEventKind,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregated play count for one ROM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayStat {
    pub rom_name: String,
    pub play_count: u64,
    pub last_played: DateTime<Utc>,
}

/// Append-only storage for play and security events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append a play event and return its id.
    async fn append_play_event(&self, rom_name: &RomName) -> Result<i64, StoreError>;

    /// Append a security event and return its id.
    async fn append_security_event(
        &self,
        kind: SecurityEventKind,
        details: Option<String>,
    ) -> Result<i64, StoreError>;

    /// Play counts per ROM, most played first, ties by name.
    async fn play_stats(&self) -> Result<Vec<PlayStat>, StoreError>;

    /// Most recent security events, newest first.
    async fn security_events(&self, limit: usize) -> Result<Vec<SecurityEvent>, StoreError>;

    /// Flush and release the store.
    async fn close(&self) -> Result<(), StoreError>;
}

/// Fixed-width RFC 3339 so that lexical order equals chronological order.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {s:?}: {e}")))
}

/// Sort stats by count descending, then name ascending.
pub(crate) fn sort_stats(stats: &mut [PlayStat]) {
    stats.sort_by(|a, b| {
        b.play_count
            .cmp(&a.play_count)
            .then_with(|| a.rom_name.cmp(&b.rom_name))
    });
}
