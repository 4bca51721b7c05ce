// Cached user record.
// The persisted merge of a list summary and, once fetched, the detail fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::{UserDetail, UserSummary};

/// One user as stored in the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedUserRecord {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub profile_url: String,
    /// Set once by the store on first insertion; orders range reads.
    pub inserted_at: DateTime<Utc>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub blog: String,
    /// True when the user came from the users feed rather than a detail lookup.
    #[serde(default = "listed_default")]
    pub listed: bool,
}

fn listed_default() -> bool {
    true
}

impl CachedUserRecord {
    /// Record for a freshly listed user; detail fields start empty.
    pub fn from_summary(summary: &UserSummary) -> Self {
        Self {
            id: summary.id,
            login: summary.login.clone(),
            avatar_url: summary.avatar_url.clone(),
            profile_url: summary.profile_url.clone(),
            inserted_at: Utc::now(),
            followers: 0,
            following: 0,
            location: String::new(),
            blog: String::new(),
            listed: true,
        }
    }

    /// Record for a user first seen through the detail endpoint.
    pub fn from_detail(id: u64, detail: &UserDetail) -> Self {
        let mut record = Self {
            id,
            login: detail.login.clone(),
            avatar_url: detail.avatar_url.clone().unwrap_or_default(),
            profile_url: detail.profile_url.clone().unwrap_or_default(),
            inserted_at: Utc::now(),
            followers: 0,
            following: 0,
            location: String::new(),
            blog: String::new(),
            listed: false,
        };
        record.apply_detail(detail);
        record
    }

    /// Overwrite the detail fields only. Identity, URLs and insertion time stay.
    pub fn apply_detail(&mut self, detail: &UserDetail) {
        self.followers = detail.followers();
        self.following = detail.following();
        self.location = detail.location().to_string();
        self.blog = detail.blog().to_string();
    }

    pub fn to_summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            login: self.login.clone(),
            avatar_url: self.avatar_url.clone(),
            profile_url: self.profile_url.clone(),
        }
    }
}
