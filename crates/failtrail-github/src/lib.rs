//! failtrail-github: GitHub Actions binding for failtrail
//!
//! Implements [`failtrail_core::HistoryClient`] over the GitHub REST API
//! using reqwest. Every failed request (transport error, status >= 400,
//! undecodable JSON) is reported as `None`, never as an error.

pub mod client;
pub mod error;

pub use client::{GitHubClient, GitHubConfig, DEFAULT_API_URL};
pub use error::ApiError;

/// Result type for client construction
pub type Result<T> = std::result::Result<T, ApiError>;
