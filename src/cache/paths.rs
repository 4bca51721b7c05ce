// Cache path utilities.
// Locates the user cache snapshot on the local filesystem.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Get the base cache directory (~/.cache/ghusers on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ghusers").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the users snapshot inside a cache directory.
pub fn users_path(dir: &Path) -> PathBuf {
    dir.join("users.json")
}

/// Scratch path used while a snapshot is being replaced.
pub fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("tmp")
}
