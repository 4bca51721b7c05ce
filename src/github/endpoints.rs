// GitHub API endpoint functions.
// Implements the remote user source on top of the REST users endpoints.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Result, SyncError};

use super::client::GitHubClient;
use super::source::UserSource;
use super::types::{UserDetail, UserSummary};

impl GitHubClient {
    /// List users with an id greater than `since`.
    pub async fn get_users(&self, per_page: u32, since: u64) -> Result<Vec<UserSummary>> {
        let params = [
            ("per_page", per_page.to_string()),
            ("since", since.to_string()),
        ];
        let response = self.get_with_params(self.url(&["users"]), &params).await?;
        let users: Vec<UserSummary> = Self::decode(response).await?;
        info!(per_page, since, fetched = users.len(), "fetched users page");
        Ok(users)
    }

    /// Get a single user by login.
    pub async fn get_user(&self, login: &str) -> Result<UserDetail> {
        if login.trim().is_empty() {
            return Err(SyncError::InvalidInput(
                "cannot request user detail without a login".to_string(),
            ));
        }
        let response = self.get(self.url(&["users", login])).await?;
        let detail: UserDetail = Self::decode(response).await?;
        debug!(login, "fetched user detail");
        Ok(detail)
    }
}

#[async_trait]
impl UserSource for GitHubClient {
    async fn fetch_page(&self, limit: u32, since: u64) -> Result<Vec<UserSummary>> {
        self.get_users(limit, since).await
    }

    async fn fetch_detail(&self, login: &str) -> Result<UserDetail> {
        self.get_user(login).await
    }
}
