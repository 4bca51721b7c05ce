// User cache store.
// Durable keyed storage of user records with an insertion-ordered index.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::github::UserDetail;

use super::paths::users_path;
use super::persist;
use super::record::CachedUserRecord;

/// Keyed storage for cached users.
///
/// Writes are serialized and either fully applied or not applied at all.
/// Reads never observe a write in progress.
#[async_trait]
pub trait UserCache: Send + Sync {
    /// The subset of `ids` already present.
    async fn exists(&self, ids: &HashSet<u64>) -> Result<HashSet<u64>>;

    /// Insert every record whose id is not yet stored. Existing records are
    /// never overwritten. Returns the number of records inserted.
    async fn insert_many(&self, records: Vec<CachedUserRecord>) -> Result<usize>;

    /// Up to `limit` records starting at `offset`, oldest insertion first.
    async fn read_range(&self, offset: usize, limit: usize) -> Result<Vec<CachedUserRecord>>;

    async fn find_by_login(&self, login: &str) -> Result<Option<CachedUserRecord>>;

    /// Merge detail fields into the record for `login`, creating it if needed.
    async fn upsert_detail(&self, login: &str, detail: &UserDetail) -> Result<CachedUserRecord>;

    /// Delete every record.
    async fn purge_all(&self) -> Result<()>;

    /// Number of stored records.
    async fn len(&self) -> Result<usize>;
}

/// File-backed cache: the full record set lives in memory and every write
/// replaces a JSON snapshot on disk before it becomes visible.
pub struct FileUserStore {
    path: PathBuf,
    records: RwLock<Vec<CachedUserRecord>>,
}

impl FileUserStore {
    /// Open (or start) the store inside `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = users_path(dir);
        let snapshot =
            persist::read_snapshot::<Vec<CachedUserRecord>>(&path).map_err(storage_error)?;
        let mut records = match snapshot {
            Some(snapshot) => snapshot.data,
            None => Vec::new(),
        };

        records.sort_by_key(|r| r.inserted_at);
        let mut seen = HashSet::new();
        let before = records.len();
        records.retain(|r| seen.insert(r.id));
        if records.len() != before {
            warn!(
                dropped = before - records.len(),
                "snapshot held duplicate ids, keeping the oldest"
            );
        }

        info!(path = %path.display(), records = records.len(), "opened user cache");
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `records` to disk off the async runtime and hand them back.
    async fn persist(&self, records: Vec<CachedUserRecord>) -> Result<Vec<CachedUserRecord>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            persist::write_snapshot(&path, &records).map_err(storage_error)?;
            Ok::<_, SyncError>(records)
        })
        .await
        .map_err(|e| SyncError::Storage(format!("persistence task failed: {e}")))?
    }
}

/// Filesystem and serialization failures while persisting are storage errors.
fn storage_error(e: SyncError) -> SyncError {
    match e {
        SyncError::Io(_) | SyncError::Storage(_) => e,
        other => SyncError::Storage(other.to_string()),
    }
}

#[async_trait]
impl UserCache for FileUserStore {
    async fn exists(&self, ids: &HashSet<u64>) -> Result<HashSet<u64>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .map(|r| r.id)
            .filter(|id| ids.contains(id))
            .collect())
    }

    async fn insert_many(&self, records: Vec<CachedUserRecord>) -> Result<usize> {
        let mut current = self.records.write().await;

        let mut seen: HashSet<u64> = current.iter().map(|r| r.id).collect();
        let now = Utc::now();
        let offered = records.len();
        let fresh: Vec<CachedUserRecord> = records
            .into_iter()
            .filter(|r| seen.insert(r.id))
            .map(|mut r| {
                r.inserted_at = now;
                r
            })
            .collect();

        if fresh.is_empty() {
            debug!(offered, "nothing new to insert");
            return Ok(0);
        }

        let inserted = fresh.len();
        let mut next = current.clone();
        next.extend(fresh);
        *current = self.persist(next).await?;

        debug!(offered, inserted, total = current.len(), "inserted users");
        Ok(inserted)
    }

    async fn read_range(&self, offset: usize, limit: usize) -> Result<Vec<CachedUserRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<CachedUserRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.login == login).cloned())
    }

    async fn upsert_detail(&self, login: &str, detail: &UserDetail) -> Result<CachedUserRecord> {
        if login.is_empty() {
            return Err(SyncError::InvalidInput(
                "cannot store detail without a login".to_string(),
            ));
        }

        let mut current = self.records.write().await;
        let mut next = current.clone();

        let existing = next.iter().position(|r| r.login == login).or_else(|| {
            detail
                .id
                .and_then(|id| next.iter().position(|r| r.id == id))
        });

        let index = match existing {
            Some(index) => {
                next[index].apply_detail(detail);
                index
            }
            None => {
                let id = detail.id.ok_or_else(|| {
                    SyncError::InvalidInput(format!(
                        "no cached user {login} and the detail carries no id"
                    ))
                })?;
                let mut record = CachedUserRecord::from_detail(id, detail);
                if record.login.is_empty() {
                    record.login = login.to_string();
                }
                next.push(record);
                next.len() - 1
            }
        };

        let merged = next[index].clone();
        *current = self.persist(next).await?;

        debug!(login, id = merged.id, created = existing.is_none(), "merged user detail");
        Ok(merged)
    }

    async fn purge_all(&self) -> Result<()> {
        let mut current = self.records.write().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist::delete(&path))
            .await
            .map_err(|e| SyncError::Storage(format!("purge task failed: {e}")))??;

        let purged = current.len();
        current.clear();
        info!(purged, "purged user cache");
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

impl std::fmt::Debug for FileUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUserStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
