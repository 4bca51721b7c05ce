// Snapshot persistence for the cache.
// Handles JSON serialization and atomic replacement of files on disk.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::Result;

use super::paths::temp_path;

/// Wrapper for persisted data with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// The persisted data.
    pub data: T,
    /// When the snapshot was written.
    pub saved_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            saved_at: Utc::now(),
        }
    }
}

/// Read a snapshot from a file. A missing file reads as `None`.
pub fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Option<Snapshot<T>>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let snapshot: Snapshot<T> = serde_json::from_str(&contents)?;
    Ok(Some(snapshot))
}

/// Replace the file at `path` with a new snapshot of `data`.
///
/// The old file stays intact until the new one is fully on disk.
pub fn write_snapshot<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let snapshot = Snapshot::new(data);
    let json = serde_json::to_string_pretty(&snapshot)?;

    let temp = temp_path(path);
    let written = write_and_rename(&temp, path, json.as_bytes());
    if written.is_err() {
        let _ = fs::remove_file(&temp);
    }
    written
}

fn write_and_rename(temp: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(temp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(temp, path)?;
    Ok(())
}

/// Delete a persisted file.
pub fn delete(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
