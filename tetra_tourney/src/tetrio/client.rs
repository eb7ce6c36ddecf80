//! HTTP client for the TETR.IO public API.

use super::{ApiUserResponse, ProviderError, ProviderResult, RankProvider, TetrioUserData};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Url;
use std::env;
use std::time::Duration;

/// TETR.IO API client configuration
#[derive(Debug, Clone)]
pub struct TetrioConfig {
    /// API root; a trailing slash is ignored
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl TetrioConfig {
    /// Create configuration from environment variables
    ///
    /// - `TETRIO_API_URL` (default: `https://ch.tetr.io/api`)
    /// - `TETRIO_TIMEOUT_SECS` (default: 10)
    /// - `TETRIO_USER_AGENT` (default: `tetra_tourney/<version>`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("TETRIO_API_URL").unwrap_or(defaults.base_url),
            timeout_secs: env::var("TETRIO_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            user_agent: env::var("TETRIO_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

impl Default for TetrioConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ch.tetr.io/api".to_string(),
            timeout_secs: 10,
            user_agent: concat!("tetra_tourney/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// TETR.IO API client
#[derive(Debug, Clone)]
pub struct TetrioClient {
    base_url: Url,
    client: reqwest::Client,
}

impl TetrioClient {
    /// Create a new client
    pub fn new(config: &TetrioConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(config.base_url.clone()));
        }

        Ok(Self { base_url, client })
    }

    /// Users are looked up by lower-cased name; the name is one encoded path segment.
    fn user_url(&self, username: &str) -> ProviderResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("users")
            .push(&username.trim().to_lowercase());
        Ok(url)
    }
}

#[async_trait]
impl RankProvider for TetrioClient {
    async fn fetch_user(&self, username: &str) -> ProviderResult<TetrioUserData> {
        let url = self.user_url(username)?;
        debug!("Fetching TETR.IO user from {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("TETR.IO request for {} failed: {}", username, e);
            ProviderError::Transient(e.to_string())
        })?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Transient(format!("status {status}")));
        }

        let body: ApiUserResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("unreadable response: {e}")))?;

        match body {
            ApiUserResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            ApiUserResponse { success: true, .. } => Err(ProviderError::Transient(
                "successful response without user data".to_string(),
            )),
            ApiUserResponse { error, .. } => {
                debug!(
                    "TETR.IO reports no user {}: {}",
                    username,
                    error.as_deref().unwrap_or("no error message")
                );
                Err(ProviderError::NotFound(username.to_string()))
            }
        }
    }
}
