// GitHub API HTTP client.
// Handles authentication, rate limiting, and request/response processing.

use parking_lot::Mutex;
use reqwest::{
    Client, Response, StatusCode, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, SyncError};

use super::types::RateLimit;

const GITHUB_API_VERSION: &str = "2022-11-28";

/// GitHub API client with optional authentication and rate limit tracking.
pub struct GitHubClient {
    client: Client,
    base: Url,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a client for the API described by `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.api_base).map_err(|e| {
            SyncError::InvalidInput(format!("invalid API base URL {}: {e}", config.api_base))
        })?;
        if base.cannot_be_a_base() {
            return Err(SyncError::InvalidInput(format!(
                "API base URL cannot carry a path: {}",
                config.api_base
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| SyncError::InvalidInput(e.to_string()))?,
            );
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("ghusers"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(SyncError::Network)?;

        Ok(Self {
            client,
            base,
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Get the most recent rate limit information.
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit.lock().clone()
    }

    /// Build an endpoint URL from escaped path segments.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`: the base can always carry a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_params<T: serde::Serialize + ?Sized>(
        &self,
        url: Url,
        params: &T,
    ) -> Result<Response> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(SyncError::Network)?;

        self.update_rate_limit(&response);
        self.check_response(response).await
    }

    /// Make a GET request to the GitHub API.
    pub async fn get(&self, url: Url) -> Result<Response> {
        self.get_with_params(url, &[] as &[(&str, &str)]).await
    }

    /// Read the full body and decode it as JSON.
    pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.bytes().await.map_err(SyncError::Network)?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "response did not match the expected shape");
            SyncError::Decode(e)
        })
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, response: &Response) {
        let header = |name: &str| -> Option<u64> {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        };

        let mut rate_limit = self.rate_limit.lock();
        if let Some(limit) = header("x-ratelimit-limit") {
            rate_limit.limit = limit;
        }
        if let Some(remaining) = header("x-ratelimit-remaining") {
            rate_limit.remaining = remaining;
        }
        if let Some(reset) = header("x-ratelimit-reset") {
            rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        warn!(%status, url = %response.url(), "GitHub request rejected");
        let rate_limit = self.rate_limit();

        match status {
            StatusCode::UNAUTHORIZED => Err(SyncError::Unauthorized),
            StatusCode::NOT_FOUND => {
                let url = response.url().to_string();
                Err(SyncError::NotFound(url))
            }
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS if rate_limit.remaining == 0 => {
                let reset_at = chrono::DateTime::from_timestamp(rate_limit.reset as i64, 0)
                    .map(|dt| dt.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                Err(SyncError::RateLimited { reset_at })
            }
            status => Err(SyncError::Http {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
