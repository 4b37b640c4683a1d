//! Startup orchestration.
//!
//! # Responsibilities
//! - Create the ROM directory and the database's parent directory
//! - Open the event store
//! - Build the shared application state
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::LauncherConfig;
use crate::http::AppState;
use crate::store::{SqliteEventStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open event store: {0}")]
    Store(#[from] StoreError),
}

/// Prepare the filesystem and storage, returning the application state.
pub fn bootstrap(config: LauncherConfig) -> Result<AppState, StartupError> {
    ensure_dir(&config.paths.roms_dir)?;
    if let Some(parent) = config.paths.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }

    let store = SqliteEventStore::open(&config.paths.db_path)?;
    tracing::info!(path = %config.paths.db_path.display(), "Event store ready");

    Ok(AppState::new(config, Arc::new(store)))
}

fn ensure_dir(path: &Path) -> Result<(), StartupError> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|source| StartupError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Created directory");
    Ok(())
}
