//! ROM directory listing.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::roms::filename::is_structurally_valid;

/// Errors from reading the ROM directory.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read ROM directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lists the ROM files available in a directory.
///
/// The directory is read on every call; contents may change between requests.
#[derive(Debug, Clone)]
pub struct RomLibrary {
    dir: PathBuf,
}

impl RomLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Return the valid ROM filenames in the directory, sorted.
    ///
    /// A missing directory yields an empty list. Entries that are not valid
    /// ROM names (or are directories) are skipped silently.
    pub async fn list_roms(&self) -> Result<Vec<String>, LibraryError> {
        let io_err = |source: std::io::Error| LibraryError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "ROM directory missing, listing nothing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(io_err(e)),
        };

        let mut roms = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_structurally_valid(&name) {
                continue;
            }
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => continue,
                Ok(_) => roms.push(name),
                Err(e) => {
                    tracing::debug!(name = %name, error = %e, "Skipping unreadable entry");
                }
            }
        }

        roms.sort();
        Ok(roms)
    }
}
