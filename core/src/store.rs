//! JSON snapshot persistence hook.
//!
//! The in-memory catalog is the source of truth within a session; a
//! consumer that wants durability loads a snapshot at startup and saves
//! one around each mutation. Writes go through a `.tmp` sibling and a
//! rename so a crash never leaves a torn file.

use std::path::{Path, PathBuf};

use platetrack_protocol::Plate;

/// Errors from the snapshot store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// File-backed catalog snapshot.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store at the XDG data directory
    /// (`~/.local/share/platetrack/catalog.json`).
    pub fn at_default_location() -> Result<Self, StoreError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| {
                StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "could not determine XDG_DATA_HOME",
                ))
            })?
            .join("platetrack");
        Ok(Self {
            path: data_dir.join("catalog.json"),
        })
    }

    /// Store at a caller-chosen path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot; a missing file is an empty catalog.
    pub fn load(&self) -> Result<Vec<Plate>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Persist a snapshot atomically via a `.tmp` sibling.
    pub fn save(&self, plates: &[Plate]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(plates)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
