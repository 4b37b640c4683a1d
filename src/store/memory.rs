//! In-memory event store.
//!
//! Same semantics as the SQLite store without durability. Handy as a fake in
//! pipeline tests and for throwaway runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::roms::RomName;
use crate::store::{
    sort_stats, EventStore, PlayEvent, PlayStat, SecurityEvent, SecurityEventKind, StoreError,
};

#[derive(Default)]
struct Tables {
    plays: Vec<PlayEvent>,
    security: Vec<SecurityEvent>,
    closed: bool,
}

/// Event store that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryEventStore {
    tables: Mutex<Tables>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every play event in insertion order.
    pub fn play_events(&self) -> Vec<PlayEvent> {
        self.tables
            .lock()
            .map(|t| t.plays.clone())
            .unwrap_or_default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".into()))?;
        if tables.closed {
            return Err(StoreError::Closed);
        }
        Ok(f(&mut tables))
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append_play_event(&self, rom_name: &RomName) -> Result<i64, StoreError> {
        self.with_tables(|t| {
            let id = t.plays.len() as i64 + 1;
            t.plays.push(PlayEvent {
                id,
                rom_name: rom_name.as_str().to_string(),
                played_at: Utc::now(),
            });
            id
        })
    }

    async fn append_security_event(
        &self,
        kind: SecurityEventKind,
        details: Option<String>,
    ) -> Result<i64, StoreError> {
        self.with_tables(|t| {
            let id = t.security.len() as i64 + 1;
            t.security.push(SecurityEvent {
                id,
                event_type: kind,
                details,
                created_at: Utc::now(),
            });
            id
        })
    }

    async fn play_stats(&self) -> Result<Vec<PlayStat>, StoreError> {
        self.with_tables(|t| {
            let mut by_name: HashMap<&str, PlayStat> = HashMap::new();
            for play in &t.plays {
                let stat = by_name
                    .entry(play.rom_name.as_str())
                    .or_insert_with(|| PlayStat {
                        rom_name: play.rom_name.clone(),
                        play_count: 0,
                        last_played: play.played_at,
                    });
                stat.play_count += 1;
                stat.last_played = stat.last_played.max(play.played_at);
            }
            let mut stats: Vec<_> = by_name.into_values().collect();
            sort_stats(&mut stats);
            stats
        })
    }

    async fn security_events(&self, limit: usize) -> Result<Vec<SecurityEvent>, StoreError> {
        self.with_tables(|t| t.security.iter().rev().take(limit).cloned().collect())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if let Ok(mut tables) = self.tables.lock() {
            tables.closed = true;
        }
        Ok(())
    }
}
