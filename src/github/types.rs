// GitHub API response types.
// Defines structs for deserializing the users list and user detail endpoints.

use serde::{Deserialize, Serialize};

/// Minimal user identity returned by `GET /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    /// Profile page, `html_url` on the wire.
    #[serde(rename = "html_url", default)]
    pub profile_url: String,
}

/// Extended user record returned by `GET /users/{login}`.
///
/// Everything except `login` may be missing or null in the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    pub login: String,
    pub id: Option<u64>,
    pub avatar_url: Option<String>,
    #[serde(rename = "html_url")]
    pub profile_url: Option<String>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub location: Option<String>,
    pub blog: Option<String>,
}

impl UserDetail {
    pub fn followers(&self) -> u64 {
        self.followers.unwrap_or(0)
    }

    pub fn following(&self) -> u64 {
        self.following.unwrap_or(0)
    }

    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or_default()
    }

    pub fn blog(&self) -> &str {
        self.blog.as_deref().unwrap_or_default()
    }
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}
