// Remote user source abstraction.
// The sync coordinator talks to GitHub only through this trait.

use async_trait::async_trait;

use crate::error::Result;

use super::types::{UserDetail, UserSummary};

/// Read-only access to the remote user feed.
///
/// Implementations never mutate local state; every failure is returned to the
/// caller unchanged.
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Fetch up to `limit` users whose id is greater than `since`, ascending by id.
    async fn fetch_page(&self, limit: u32, since: u64) -> Result<Vec<UserSummary>>;

    /// Fetch the detail record for `login`.
    ///
    /// An empty login fails with `InvalidInput` before any request is made.
    async fn fetch_detail(&self, login: &str) -> Result<UserDetail>;
}
