//! Error types for failtrail-github

use thiserror::Error;

/// Errors that can occur while setting up the GitHub client.
///
/// Requests themselves never error; see [`crate::GitHubClient`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// Base URL is not an absolute http(s) URL
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// Token contains characters not allowed in a header
    #[error("Token is not a valid header value")]
    InvalidToken,

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}
