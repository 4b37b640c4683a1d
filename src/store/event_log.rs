//! Telemetry facade over an [`EventStore`].
//!
//! Losing telemetry must never block gameplay: play appends report failure as
//! `None`, security appends swallow failures after one log line.

use std::sync::Arc;

use crate::observability::metrics;
use crate::roms::RomName;
use crate::store::{EventStore, PlayStat, SecurityEvent, SecurityEventKind, StoreError};

/// Shared handle to the event log.
#[derive(Clone)]
pub struct EventLog {
    store: Arc<dyn EventStore>,
}

impl EventLog {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Record an accepted play. Returns the event id, or `None` if it was lost.
    pub async fn record_play(&self, rom_name: &RomName) -> Option<i64> {
        match self.store.append_play_event(rom_name).await {
            Ok(id) => {
                tracing::debug!(rom = %rom_name, id, "Logged ROM play");
                metrics::record_play();
                Some(id)
            }
            Err(e) => {
                let message = format!("Failed to log rom play for {:?}: {}", rom_name.as_str(), e);
                tracing::warn!(rom = %rom_name, error = %e, "ROM play logging failed (non-critical)");
                self.record_security_event(SecurityEventKind::RomPlayLogError, Some(message))
                    .await;
                None
            }
        }
    }

    /// Record a security event. Failures only reach the operational log.
    pub async fn record_security_event(&self, kind: SecurityEventKind, details: Option<String>) {
        metrics::record_security_event(kind.as_str());
        if let Err(e) = self.store.append_security_event(kind, details).await {
            tracing::error!(event_type = %kind, error = %e, "Failed to log security event");
        }
    }

    pub async fn play_stats(&self) -> Result<Vec<PlayStat>, StoreError> {
        self.store.play_stats().await
    }

    pub async fn security_events(&self, limit: usize) -> Result<Vec<SecurityEvent>, StoreError> {
        self.store.security_events(limit).await
    }

    pub async fn close(&self) -> Result<(), StoreError> {
        self.store.close().await
    }
}
