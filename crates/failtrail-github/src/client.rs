//! GitHub REST client
//!
//! Sends authenticated GET requests to the Actions API. Job log endpoints
//! answer with a redirect to blob storage, which reqwest follows (dropping
//! the `Authorization` header on the cross-host hop).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use failtrail_core::HistoryClient;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::Result;

/// Public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// GitHub client configuration
#[derive(Clone)]
pub struct GitHubConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Personal access token or Actions `GITHUB_TOKEN`
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// `User-Agent` header (required by GitHub)
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("failtrail/{}", failtrail_core::VERSION),
        }
    }
}

impl GitHubConfig {
    /// Create config from `GITHUB_API_URL` and `GITHUB_TOKEN`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            if !url.is_empty() {
                config = config.with_base_url(&url);
            }
        }
        config.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        config
    }

    /// Use a different API root (GitHub Enterprise, test server)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// GitHub Actions history client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: GitHubConfig) -> Result<Self> {
        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(config.base_url));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(GitHubClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GitHubConfig::from_env())
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// GET `path` and return the body, or `None` on any failure
    async fn request(&self, path: &str) -> Option<String> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%path, error = %e, "GitHub request failed");
                return None;
            }
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            warn!(%path, status = status.as_u16(), "GitHub request rejected");
            return None;
        }

        match response.text().await {
            Ok(body) => {
                debug!(%path, status = status.as_u16(), bytes = body.len(), "GitHub response");
                Some(body)
            }
            Err(e) => {
                warn!(%path, error = %e, "Failed to read GitHub response body");
                None
            }
        }
    }
}

#[async_trait]
impl HistoryClient for GitHubClient {
    async fn fetch_json(&self, path: &str) -> Option<Value> {
        let body = self.request(path).await?;
        match serde_json::from_str::<Value>(&body) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
            Ok(_) => {
                warn!(%path, "GitHub response is not a JSON object or array");
                None
            }
            Err(e) => {
                warn!(%path, error = %e, "GitHub response is not valid JSON");
                None
            }
        }
    }

    async fn fetch_raw(&self, path: &str) -> Option<String> {
        self.request(path).await
    }
}
