// Runtime configuration.
// Reads API location, credentials, paging, and cache placement from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::paths;
use crate::error::{Result, SyncError};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// GitHub rejects `per_page` values above this.
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by the remote source, the cache store, and the coordinator.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the GitHub REST API, without a trailing slash.
    pub api_base: String,
    /// Optional personal access token. The public users API works without one.
    pub token: Option<String>,
    /// Users requested per remote page.
    pub page_size: u32,
    /// Directory holding the user cache snapshot.
    pub cache_dir: PathBuf,
    /// Transport timeout applied to every request.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            cache_dir: paths::cache_dir().unwrap_or_else(|| PathBuf::from(".ghusers-cache")),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Build a config from `GHUSERS_*` variables and `GITHUB_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(base) = lookup("GHUSERS_API_URL") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        config.token = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty());
        if let Some(size) = lookup("GHUSERS_PAGE_SIZE") {
            config.page_size = parse_page_size(&size)?;
        }
        if let Some(dir) = lookup("GHUSERS_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("GHUSERS_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                SyncError::InvalidInput(format!("GHUSERS_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_page_size(raw: &str) -> Result<u32> {
    let size: u32 = raw.trim().parse().map_err(|_| {
        SyncError::InvalidInput(format!("GHUSERS_PAGE_SIZE is not a number: {raw}"))
    })?;
    if size == 0 {
        return Err(SyncError::InvalidInput(
            "GHUSERS_PAGE_SIZE must be at least 1".to_string(),
        ));
    }
    Ok(size.min(MAX_PAGE_SIZE))
}
