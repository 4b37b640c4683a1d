//! SQLite-backed event store.
//!
//! The single connection lives behind a mutex so concurrent appends are
//! serialized and keep insertion order within a table. All SQLite calls run
//! on the blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::roms::RomName;
use crate::store::{
    format_timestamp, parse_timestamp, EventStore, PlayStat, SecurityEvent, SecurityEventKind,
    StoreError,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS rom_plays (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rom_name TEXT NOT NULL,
    played_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rom_plays_rom_name ON rom_plays(rom_name);

CREATE TABLE IF NOT EXISTS security_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL,
    details TEXT,
    created_at TEXT NOT NULL
);
"#;

/// Durable event store backed by a SQLite file.
#[derive(Clone)]
pub struct SqliteEventStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteEventStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;

        // WAL keeps readers off the writer's back.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        debug!(path = %path.as_ref().display(), "Opened event database");
        Self::init(conn)
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection mutex poisoned".into()))?;
            match guard.as_ref() {
                Some(conn) => f(conn),
                None => Err(StoreError::Closed),
            }
        })
        .await?
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn append_play_event(&self, rom_name: &RomName) -> Result<i64, StoreError> {
        let rom_name = rom_name.as_str().to_string();
        let played_at = format_timestamp(Utc::now());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO rom_plays (rom_name, played_at) VALUES (?1, ?2)",
                params![rom_name, played_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn append_security_event(
        &self,
        kind: SecurityEventKind,
        details: Option<String>,
    ) -> Result<i64, StoreError> {
        let created_at = format_timestamp(Utc::now());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO security_events (event_type, details, created_at) VALUES (?1, ?2, ?3)",
                params![kind.as_str(), details, created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn play_stats(&self) -> Result<Vec<PlayStat>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"SELECT rom_name, COUNT(*) AS play_count, MAX(played_at) AS last_played
                   FROM rom_plays
                   GROUP BY rom_name
                   ORDER BY play_count DESC, rom_name ASC"#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut stats = Vec::new();
            for row in rows {
                let (rom_name, play_count, last_played) = row?;
                stats.push(PlayStat {
                    rom_name,
                    play_count: play_count as u64,
                    last_played: parse_timestamp(&last_played)?,
                });
            }
            Ok(stats)
        })
        .await
    }

    async fn security_events(&self, limit: usize) -> Result<Vec<SecurityEvent>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                r#"SELECT id, event_type, details, created_at
                   FROM security_events
                   ORDER BY id DESC
                   LIMIT ?1"#,
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?;

            let mut events = Vec::new();
            for row in rows {
                let (id, event_type, details, created_at) = row?;
                events.push(SecurityEvent {
                    id,
                    event_type: event_type.parse()?,
                    details,
                    created_at: parse_timestamp(&created_at)?,
                });
            }
            Ok(events)
        })
        .await
    }

    async fn close(&self) -> Result<(), StoreError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection mutex poisoned".into()))?;
            match guard.take() {
                Some(conn) => conn.close().map_err(|(_, e)| StoreError::Sqlite(e)),
                None => Ok(()),
            }
        })
        .await?
    }
}
