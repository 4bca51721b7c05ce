// Sync coordinator.
// Reconciles the paginated remote user feed with the local cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CachedUserRecord, UserCache};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{Result, SyncError};
use crate::github::{UserSource, UserSummary};

/// In-memory view handed to the presentation layer.
#[derive(Debug, Default)]
struct PageState {
    /// Users shown so far, in cache insertion order, unique by id.
    page: Vec<UserSummary>,
    /// Highest id seen on the remote feed; the next remote page starts after it.
    cursor: u64,
    /// Cache rows already replayed into the page.
    replayed: usize,
    /// Set once `load_initial` has succeeded.
    initialized: bool,
    /// Bumped by `reset`; loads started under an older value are dropped.
    generation: u64,
}

impl PageState {
    /// Append users not already on the page, returning the ones added.
    fn append(&mut self, batch: Vec<UserSummary>) -> Vec<UserSummary> {
        let mut seen: HashSet<u64> = self.page.iter().map(|u| u.id).collect();
        let added: Vec<UserSummary> = batch.into_iter().filter(|u| seen.insert(u.id)).collect();
        self.page.extend(added.iter().cloned());
        added
    }

    /// Raise the cursor to the highest feed id in `records`.
    ///
    /// Records created from a detail lookup are not feed positions.
    fn observe_cached(&mut self, records: &[CachedUserRecord]) {
        if let Some(max) = records.iter().filter(|r| r.listed).map(|r| r.id).max() {
            self.cursor = self.cursor.max(max);
        }
    }
}

/// Marks a page load in progress and clears the mark on drop.
struct FetchGuard<'a>(&'a AtomicBool);

impl<'a> FetchGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives first-page, load-more, detail and reset operations.
///
/// Serves cached users before touching the network, writes only users the
/// cache has not seen, and never leaves a partial write behind: every error
/// from the source or the cache is returned unchanged and leaves the
/// in-memory page and cursor as they were.
///
/// Cache writes and page updates run in a single lane shared with `reset`,
/// so a page that arrives after a reset is discarded instead of refilling
/// the purged cache.
pub struct SyncCoordinator<S: ?Sized, C: ?Sized> {
    source: Arc<S>,
    cache: Arc<C>,
    page_size: u32,
    state: Mutex<PageState>,
    in_flight: AtomicBool,
    lane: tokio::sync::Mutex<()>,
}

impl<S, C> SyncCoordinator<S, C>
where
    S: UserSource + ?Sized,
    C: UserCache + ?Sized,
{
    pub fn new(source: Arc<S>, cache: Arc<C>, page_size: u32) -> Self {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        Self {
            source,
            cache,
            page_size,
            state: Mutex::new(PageState::default()),
            in_flight: AtomicBool::new(false),
            lane: tokio::sync::Mutex::new(()),
        }
    }

    /// First page of users: from the cache when it has any, otherwise from
    /// the remote feed starting at the beginning.
    pub async fn load_initial(&self) -> Result<Vec<UserSummary>> {
        let Some(_guard) = FetchGuard::try_acquire(&self.in_flight) else {
            debug!("page load already in flight, returning current page");
            return Ok(self.page());
        };

        let generation = {
            let _lane = self.lane.lock().await;
            let cached = self.cache.read_range(0, self.limit()).await?;
            let mut state = self.state.lock();
            if !cached.is_empty() {
                let page: Vec<UserSummary> =
                    cached.iter().map(CachedUserRecord::to_summary).collect();
                state.observe_cached(&cached);
                state.page = page.clone();
                state.replayed = cached.len();
                state.initialized = true;
                info!(
                    users = page.len(),
                    cursor = state.cursor,
                    "served first page from cache"
                );
                return Ok(page);
            }
            state.generation
        };

        let fetched = self.source.fetch_page(self.page_size, 0).await?;

        let _lane = self.lane.lock().await;
        if self.is_stale(generation) {
            debug!("cache was reset during the first page fetch, dropping it");
            return Ok(Vec::new());
        }
        self.store_unseen(&fetched).await?;
        let replayed = self.cache.len().await?;

        let mut state = self.state.lock();
        state.cursor = max_id(&fetched).unwrap_or(0);
        state.page.clear();
        state.append(fetched.clone());
        state.replayed = replayed;
        state.initialized = true;
        info!(
            users = fetched.len(),
            cursor = state.cursor,
            "fetched first page from GitHub"
        );
        Ok(fetched)
    }

    /// Next page of users, appended to the in-memory page.
    ///
    /// Cached users beyond the current page are replayed first; once the
    /// cache is exhausted the remote feed is asked for users after the
    /// cursor. Returns only the users newly appended. Returns nothing while
    /// another load is in flight, before `load_initial` has succeeded, or
    /// when a `reset` lands while the remote page is in flight.
    pub async fn load_more(&self) -> Result<Vec<UserSummary>> {
        let Some(_guard) = FetchGuard::try_acquire(&self.in_flight) else {
            debug!("page load already in flight, ignoring load more");
            return Ok(Vec::new());
        };

        let (generation, cursor) = {
            let _lane = self.lane.lock().await;
            let (generation, mut offset) = {
                let state = self.state.lock();
                if !state.initialized {
                    warn!("load more requested before the first page was loaded");
                    return Ok(Vec::new());
                }
                (state.generation, state.replayed)
            };

            loop {
                let cached = self.cache.read_range(offset, self.limit()).await?;
                if cached.is_empty() {
                    break;
                }
                offset += cached.len();

                let mut state = self.state.lock();
                state.replayed = offset;
                state.observe_cached(&cached);
                let batch = cached.iter().map(CachedUserRecord::to_summary).collect();
                let added = state.append(batch);
                if !added.is_empty() {
                    debug!(offset, replayed = added.len(), "replayed cached users");
                    return Ok(added);
                }
            }

            (generation, self.cursor())
        };

        let fetched = self.source.fetch_page(self.page_size, cursor).await?;
        if fetched.is_empty() {
            info!(cursor, "remote feed exhausted");
            return Ok(Vec::new());
        }

        let _lane = self.lane.lock().await;
        if self.is_stale(generation) {
            debug!(since = cursor, "cache was reset during the fetch, dropping page");
            return Ok(Vec::new());
        }
        self.store_unseen(&fetched).await?;
        let replayed = self.cache.len().await?;

        let mut state = self.state.lock();
        if let Some(max) = max_id(&fetched) {
            state.cursor = state.cursor.max(max);
        }
        state.replayed = replayed;
        let added = state.append(fetched);
        info!(
            since = cursor,
            added = added.len(),
            cursor = state.cursor,
            "fetched next page from GitHub"
        );
        Ok(added)
    }

    /// Fetch detail for `summary` and merge it into its cached record.
    ///
    /// A summary without a login is rejected before any request is made.
    /// The summary id fills in for a detail payload that omits its id.
    pub async fn load_detail(&self, summary: &UserSummary) -> Result<CachedUserRecord> {
        self.fetch_and_merge(&summary.login, Some(summary.id)).await
    }

    /// Fetch detail for a login with no known summary.
    ///
    /// The record can only be created when the payload carries an id.
    pub async fn load_detail_by_login(&self, login: &str) -> Result<CachedUserRecord> {
        self.fetch_and_merge(login, None).await
    }

    async fn fetch_and_merge(
        &self,
        login: &str,
        fallback_id: Option<u64>,
    ) -> Result<CachedUserRecord> {
        if login.trim().is_empty() {
            return Err(SyncError::InvalidInput(match fallback_id {
                Some(id) => format!("user {id} has no login"),
                None => "login is empty".to_string(),
            }));
        }

        let mut detail = self.source.fetch_detail(login).await?;
        if detail.id.is_none() {
            detail.id = fallback_id;
        }
        let record = self.cache.upsert_detail(login, &detail).await?;
        debug!(login = %record.login, followers = record.followers, "loaded user detail");
        Ok(record)
    }

    /// Purge the cache and start pagination over.
    ///
    /// A page load still waiting on the network when this runs is discarded.
    pub async fn reset(&self) -> Result<()> {
        let _lane = self.lane.lock().await;
        self.cache.purge_all().await?;

        let mut state = self.state.lock();
        let generation = state.generation + 1;
        *state = PageState {
            generation,
            ..PageState::default()
        };
        info!(generation, "cache purged, pagination reset");
        Ok(())
    }

    /// Users loaded so far.
    pub fn page(&self) -> Vec<UserSummary> {
        self.state.lock().page.clone()
    }

    pub fn cursor(&self) -> u64 {
        self.state.lock().cursor
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn limit(&self) -> usize {
        self.page_size as usize
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.state.lock().generation != generation
    }

    /// Insert the users from `batch` the cache does not hold yet.
    async fn store_unseen(&self, batch: &[UserSummary]) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let ids: HashSet<u64> = batch.iter().map(|u| u.id).collect();
        let known = self.cache.exists(&ids).await?;
        let unseen: Vec<CachedUserRecord> = batch
            .iter()
            .filter(|u| !known.contains(&u.id))
            .map(CachedUserRecord::from_summary)
            .collect();

        if unseen.is_empty() {
            debug!(fetched = batch.len(), "every fetched user already cached");
            return Ok(0);
        }

        let inserted = self.cache.insert_many(unseen).await?;
        debug!(
            fetched = batch.len(),
            already_cached = known.len(),
            inserted,
            "cached new users"
        );
        Ok(inserted)
    }
}

fn max_id(users: &[UserSummary]) -> Option<u64> {
    users.iter().map(|u| u.id).max()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    use super::*;
    use crate::cache::FileUserStore;
    use crate::cache::paths::temp_path;
    use crate::error::ErrorKind;
    use crate::github::UserDetail;

    /// Lets a test hold a fetch open while it issues other calls.
    #[derive(Default)]
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    #[derive(Default)]
    struct FakeSource {
        pages: Mutex<VecDeque<Result<Vec<UserSummary>>>>,
        details: Mutex<VecDeque<Result<UserDetail>>>,
        page_calls: Mutex<Vec<(u32, u64)>>,
        detail_calls: Mutex<Vec<String>>,
        gate: Mutex<Option<Arc<Gate>>>,
    }

    impl FakeSource {
        fn push_page(&self, page: Result<Vec<UserSummary>>) {
            self.pages.lock().push_back(page);
        }

        fn push_detail(&self, detail: Result<UserDetail>) {
            self.details.lock().push_back(detail);
        }

        fn hold_next_fetch(&self, gate: Arc<Gate>) {
            *self.gate.lock() = Some(gate);
        }

        fn page_calls(&self) -> Vec<(u32, u64)> {
            self.page_calls.lock().clone()
        }

        fn detail_calls(&self) -> Vec<String> {
            self.detail_calls.lock().clone()
        }
    }

    #[async_trait]
    impl UserSource for FakeSource {
        async fn fetch_page(&self, limit: u32, since: u64) -> Result<Vec<UserSummary>> {
            self.page_calls.lock().push((limit, since));
            let gate = self.gate.lock().take();
            if let Some(gate) = gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            self.pages.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn fetch_detail(&self, login: &str) -> Result<UserDetail> {
            self.detail_calls.lock().push(login.to_string());
            self.details
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(SyncError::NotFound(login.to_string())))
        }
    }

    fn unavailable() -> SyncError {
        SyncError::Http {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "try later".to_string(),
        }
    }

    fn user(id: u64, login: &str) -> UserSummary {
        UserSummary {
            id,
            login: login.to_string(),
            avatar_url: format!("https://avatars.example/{id}"),
            profile_url: format!("https://github.com/{login}"),
        }
    }

    fn users(ids: impl IntoIterator<Item = u64>) -> Vec<UserSummary> {
        ids.into_iter().map(|id| user(id, &format!("user{id}"))).collect()
    }

    fn ids(users: &[UserSummary]) -> Vec<u64> {
        users.iter().map(|u| u.id).collect()
    }

    struct Harness {
        _dir: TempDir,
        source: Arc<FakeSource>,
        store: Arc<FileUserStore>,
        coordinator: SyncCoordinator<FakeSource, FileUserStore>,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::default());
        let store = Arc::new(FileUserStore::open(dir.path()).unwrap());
        let coordinator = SyncCoordinator::new(Arc::clone(&source), Arc::clone(&store), 20);
        Harness {
            _dir: dir,
            source,
            store,
            coordinator,
        }
    }

    async fn cached_ids(store: &FileUserStore) -> Vec<u64> {
        store
            .read_range(0, 1000)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect()
    }

    #[tokio::test]
    async fn test_first_page_then_load_more_dedups() {
        let h = harness();
        h.source.push_page(Ok(vec![user(1, "a"), user(2, "b")]));
        h.source.push_page(Ok(vec![user(2, "b"), user(3, "c")]));

        let first = h.coordinator.load_initial().await.unwrap();
        assert_eq!(ids(&first), vec![1, 2]);
        assert_eq!(h.coordinator.cursor(), 2);
        assert_eq!(cached_ids(&h.store).await, vec![1, 2]);

        let more = h.coordinator.load_more().await.unwrap();
        assert_eq!(ids(&more), vec![3]);
        assert_eq!(h.coordinator.cursor(), 3);
        assert_eq!(cached_ids(&h.store).await, vec![1, 2, 3]);
        assert_eq!(ids(&h.coordinator.page()), vec![1, 2, 3]);

        assert_eq!(h.source.page_calls(), vec![(20, 0), (20, 2)]);
    }

    #[tokio::test]
    async fn test_load_initial_serves_cache_without_network() {
        let h = harness();
        let seed = users(1..=25)
            .iter()
            .map(CachedUserRecord::from_summary)
            .collect();
        h.store.insert_many(seed).await.unwrap();

        let first = h.coordinator.load_initial().await.unwrap();

        assert_eq!(ids(&first), (1..=20).collect::<Vec<u64>>());
        assert!(h.source.page_calls().is_empty());
        assert_eq!(h.coordinator.cursor(), 20);
    }

    #[tokio::test]
    async fn test_load_more_replays_cache_before_remote() {
        let h = harness();
        let seed = users(1..=25)
            .iter()
            .map(CachedUserRecord::from_summary)
            .collect();
        h.store.insert_many(seed).await.unwrap();
        h.source.push_page(Ok(users(26..=27)));

        h.coordinator.load_initial().await.unwrap();
        let replayed = h.coordinator.load_more().await.unwrap();
        assert_eq!(ids(&replayed), (21..=25).collect::<Vec<u64>>());
        assert!(h.source.page_calls().is_empty());
        assert_eq!(h.coordinator.cursor(), 25);

        let fetched = h.coordinator.load_more().await.unwrap();
        assert_eq!(ids(&fetched), vec![26, 27]);
        assert_eq!(h.source.page_calls(), vec![(20, 25)]);
        assert_eq!(h.coordinator.page().len(), 27);
    }

    #[tokio::test]
    async fn test_reset_starts_over_from_remote() {
        let h = harness();
        h.source.push_page(Ok(users([1, 2])));
        h.source.push_page(Ok(users([1, 2, 3])));
        h.coordinator.load_initial().await.unwrap();

        h.coordinator.reset().await.unwrap();
        assert_eq!(h.coordinator.cursor(), 0);
        assert!(h.coordinator.page().is_empty());
        assert_eq!(h.store.len().await.unwrap(), 0);

        let first = h.coordinator.load_initial().await.unwrap();
        assert_eq!(ids(&first), vec![1, 2, 3]);
        assert_eq!(h.source.page_calls(), vec![(20, 0), (20, 0)]);
    }

    #[tokio::test]
    async fn test_load_initial_failure_leaves_cache_empty() {
        let h = harness();
        h.source.push_page(Err(unavailable()));
        h.source.push_page(Ok(users([5])));

        let err = h.coordinator.load_initial().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(h.store.len().await.unwrap(), 0);
        assert_eq!(h.coordinator.cursor(), 0);
        assert!(!h.coordinator.is_loading());

        // Nothing is retried automatically; the caller asks again.
        let first = h.coordinator.load_initial().await.unwrap();
        assert_eq!(ids(&first), vec![5]);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_and_keeps_state() {
        let h = harness();
        std::fs::create_dir(temp_path(h.store.path())).unwrap();
        h.source.push_page(Ok(users([1, 2])));

        let err = h.coordinator.load_initial().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(h.store.len().await.unwrap(), 0);
        assert_eq!(h.coordinator.cursor(), 0);
        assert!(h.coordinator.page().is_empty());
    }

    #[tokio::test]
    async fn test_load_more_failure_releases_in_flight_flag() {
        let h = harness();
        h.source.push_page(Ok(users([1, 2])));
        h.source.push_page(Err(unavailable()));
        h.source.push_page(Ok(users([3, 4])));
        h.coordinator.load_initial().await.unwrap();

        let err = h.coordinator.load_more().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(!h.coordinator.is_loading());
        assert_eq!(h.coordinator.cursor(), 2);

        let more = h.coordinator.load_more().await.unwrap();
        assert_eq!(ids(&more), vec![3, 4]);
        assert_eq!(h.source.page_calls(), vec![(20, 0), (20, 2), (20, 2)]);
    }

    #[tokio::test]
    async fn test_detail_only_user_does_not_move_cursor() {
        let h = harness();
        h.source.push_page(Ok(users([1, 2])));
        h.source.push_detail(Ok(UserDetail {
            login: "octocat".to_string(),
            id: Some(583231),
            ..UserDetail::default()
        }));
        h.source.push_page(Ok(users([3, 4])));

        h.coordinator.load_initial().await.unwrap();
        h.coordinator.load_detail_by_login("octocat").await.unwrap();

        let replayed = h.coordinator.load_more().await.unwrap();
        assert_eq!(ids(&replayed), vec![583231]);
        assert_eq!(h.coordinator.cursor(), 2);

        let fetched = h.coordinator.load_more().await.unwrap();
        assert_eq!(ids(&fetched), vec![3, 4]);
        assert_eq!(h.source.page_calls(), vec![(20, 0), (20, 2)]);
        assert_eq!(h.coordinator.cursor(), 4);
    }

    #[tokio::test]
    async fn test_cached_first_page_cursor_skips_detail_only_users() {
        let h = harness();
        h.store
            .insert_many(users([1, 2]).iter().map(CachedUserRecord::from_summary).collect())
            .await
            .unwrap();
        h.source.push_detail(Ok(UserDetail {
            login: "octocat".to_string(),
            id: Some(583231),
            ..UserDetail::default()
        }));
        h.coordinator.load_detail_by_login("octocat").await.unwrap();

        let first = h.coordinator.load_initial().await.unwrap();
        assert_eq!(ids(&first), vec![1, 2, 583231]);
        assert_eq!(h.coordinator.cursor(), 2);

        h.coordinator.load_more().await.unwrap();
        assert_eq!(h.source.page_calls(), vec![(20, 2)]);
    }

    #[tokio::test]
    async fn test_reset_during_load_more_discards_the_page() {
        let h = harness();
        h.source.push_page(Ok(users([1, 2])));
        h.source.push_page(Ok(users([3, 4])));
        h.source.push_page(Ok(users([1])));
        h.coordinator.load_initial().await.unwrap();

        let gate = Arc::new(Gate::default());
        h.source.hold_next_fetch(Arc::clone(&gate));

        let resetting = async {
            gate.entered.notified().await;
            h.coordinator.reset().await.unwrap();
            gate.release.notify_one();
        };
        let (more, ()) = tokio::join!(h.coordinator.load_more(), resetting);

        assert!(more.unwrap().is_empty());
        assert_eq!(h.store.len().await.unwrap(), 0);
        assert_eq!(h.coordinator.cursor(), 0);
        assert!(h.coordinator.page().is_empty());
        assert!(!h.coordinator.is_loading());

        let first = h.coordinator.load_initial().await.unwrap();
        assert_eq!(ids(&first), vec![1]);
        assert_eq!(h.source.page_calls(), vec![(20, 0), (20, 2), (20, 0)]);
    }

    #[tokio::test]
    async fn test_rows_cached_elsewhere_replay_before_remote() {
        let h = harness();
        h.source.push_page(Ok(users([1, 2])));
        h.source.push_page(Ok(users([3])));
        h.source.push_page(Ok(users([4])));
        h.coordinator.load_initial().await.unwrap();

        // Cached behind the coordinator's back after the page was built.
        h.store
            .insert_many(vec![CachedUserRecord::from_summary(&user(3, "user3"))])
            .await
            .unwrap();
        let replayed = h.coordinator.load_more().await.unwrap();
        assert_eq!(ids(&replayed), vec![3]);

        let fetched = h.coordinator.load_more().await.unwrap();
        assert_eq!(ids(&fetched), vec![4]);
        assert_eq!(h.source.page_calls(), vec![(20, 0), (20, 3)]);
    }

    #[tokio::test]
    async fn test_load_more_before_initial_is_noop() {
        let h = harness();
        let more = h.coordinator.load_more().await.unwrap();
        assert!(more.is_empty());
        assert!(h.source.page_calls().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_load_more_is_ignored() {
        let h = harness();
        h.source.push_page(Ok(users([1])));
        h.source.push_page(Ok(users([2])));
        h.coordinator.load_initial().await.unwrap();

        let gate = Arc::new(Gate::default());
        h.source.hold_next_fetch(Arc::clone(&gate));

        let overlapping = async {
            gate.entered.notified().await;
            assert!(h.coordinator.is_loading());
            let result = h.coordinator.load_more().await.unwrap();
            gate.release.notify_one();
            result
        };
        let (first, overlapping) = tokio::join!(h.coordinator.load_more(), overlapping);

        assert_eq!(ids(&first.unwrap()), vec![2]);
        assert!(overlapping.is_empty());
        assert_eq!(h.source.page_calls(), vec![(20, 0), (20, 1)]);
        assert!(!h.coordinator.is_loading());
    }

    #[tokio::test]
    async fn test_empty_page_keeps_cursor() {
        let h = harness();
        h.source.push_page(Ok(users([10, 11])));
        h.source.push_page(Ok(Vec::new()));
        h.coordinator.load_initial().await.unwrap();

        assert!(h.coordinator.load_more().await.unwrap().is_empty());
        assert_eq!(h.coordinator.cursor(), 11);
    }

    #[tokio::test]
    async fn test_cursor_never_moves_backwards() {
        let h = harness();
        h.source.push_page(Ok(users([10, 11])));
        h.source.push_page(Ok(users([4, 5])));
        h.coordinator.load_initial().await.unwrap();

        let more = h.coordinator.load_more().await.unwrap();
        assert_eq!(ids(&more), vec![4, 5]);
        assert_eq!(h.coordinator.cursor(), 11);
    }

    #[tokio::test]
    async fn test_load_detail_rejects_empty_login_locally() {
        let h = harness();
        let err = h
            .coordinator
            .load_detail(&user(1, ""))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(h.source.detail_calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_detail_merges_into_cached_record() {
        let h = harness();
        let mut seed = CachedUserRecord::from_summary(&user(7, "a"));
        seed.avatar_url = "x".to_string();
        h.store.insert_many(vec![seed]).await.unwrap();
        h.source.push_detail(Ok(UserDetail {
            login: "a".to_string(),
            followers: Some(5),
            ..UserDetail::default()
        }));

        let record = h.coordinator.load_detail(&user(7, "a")).await.unwrap();

        assert_eq!(record.id, 7);
        assert_eq!(record.avatar_url, "x");
        assert_eq!(record.followers, 5);
        assert_eq!(record.following, 0);
        assert_eq!(h.source.detail_calls(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_load_detail_for_uncached_user_uses_summary_id() {
        let h = harness();
        h.source.push_detail(Ok(UserDetail {
            login: "fresh".to_string(),
            location: Some("Da Nang".to_string()),
            ..UserDetail::default()
        }));

        let record = h.coordinator.load_detail(&user(31, "fresh")).await.unwrap();

        assert_eq!(record.id, 31);
        assert_eq!(record.location, "Da Nang");
        assert_eq!(cached_ids(&h.store).await, vec![31]);
    }

    #[tokio::test]
    async fn test_load_detail_by_login_without_id_is_rejected() {
        let h = harness();
        h.source.push_detail(Ok(UserDetail {
            login: "ghost".to_string(),
            ..UserDetail::default()
        }));

        let err = h
            .coordinator
            .load_detail_by_login("ghost")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(h.store.len().await.unwrap(), 0);
        assert_eq!(h.source.detail_calls(), vec!["ghost".to_string()]);
    }

    #[tokio::test]
    async fn test_load_detail_by_login_merges_cached_record() {
        let h = harness();
        h.store
            .insert_many(vec![CachedUserRecord::from_summary(&user(7, "a"))])
            .await
            .unwrap();
        h.source.push_detail(Ok(UserDetail {
            login: "a".to_string(),
            following: Some(2),
            ..UserDetail::default()
        }));

        let record = h.coordinator.load_detail_by_login("a").await.unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.following, 2);
        assert!(record.listed);
    }

    #[tokio::test]
    async fn test_load_detail_failure_leaves_cache_untouched() {
        let h = harness();
        h.store
            .insert_many(vec![CachedUserRecord::from_summary(&user(7, "a"))])
            .await
            .unwrap();
        h.source.push_detail(Err(unavailable()));

        let err = h.coordinator.load_detail(&user(7, "a")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);

        let record = h.store.find_by_login("a").await.unwrap().unwrap();
        assert_eq!(record.followers, 0);
    }

    #[tokio::test]
    async fn test_zero_page_size_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let coordinator = SyncCoordinator::new(
            Arc::new(FakeSource::default()),
            Arc::new(FileUserStore::open(dir.path()).unwrap()),
            0,
        );
        assert_eq!(coordinator.page_size(), DEFAULT_PAGE_SIZE);
    }
}
