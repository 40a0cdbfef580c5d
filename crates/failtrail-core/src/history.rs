//! Remote CI history capability.
//!
//! The discovery core reads the provider only through [`HistoryClient`]:
//! - `fetch_json`: decoded JSON body of a path
//! - `fetch_raw`: raw text body of a path
//!
//! Both return `None` for anything that is not a usable success response
//! (transport error, status >= 400, undecodable body). The production
//! binding lives in `failtrail-github`; an in-memory fake is provided in
//! the `fakes` module.

use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::domain::RunFilter;

/// Jobs requested per run listing page.
pub const JOBS_PER_PAGE: u32 = 100;

/// Bytes left as-is in a path segment or query value (RFC 3986 unreserved).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Read-only access to a CI provider's run history.
#[async_trait]
pub trait HistoryClient: Send + Sync {
    /// GET `path` and decode the body as JSON.
    async fn fetch_json(&self, path: &str) -> Option<Value>;

    /// GET `path` and return the body as text.
    async fn fetch_raw(&self, path: &str) -> Option<String>;
}

#[async_trait]
impl<T: HistoryClient + ?Sized> HistoryClient for &T {
    async fn fetch_json(&self, path: &str) -> Option<Value> {
        (**self).fetch_json(path).await
    }

    async fn fetch_raw(&self, path: &str) -> Option<String> {
        (**self).fetch_raw(path).await
    }
}

#[async_trait]
impl<T: HistoryClient + ?Sized> HistoryClient for Arc<T> {
    async fn fetch_json(&self, path: &str) -> Option<Value> {
        (**self).fetch_json(path).await
    }

    async fn fetch_raw(&self, path: &str) -> Option<String> {
        (**self).fetch_raw(path).await
    }
}

#[async_trait]
impl<T: HistoryClient + ?Sized> HistoryClient for Box<T> {
    async fn fetch_json(&self, path: &str) -> Option<Value> {
        (**self).fetch_json(path).await
    }

    async fn fetch_raw(&self, path: &str) -> Option<String> {
        (**self).fetch_raw(path).await
    }
}

/// Failed runs of the filter's workflow on its branch, newest first.
pub fn failed_runs_path(filter: &RunFilter) -> String {
    format!(
        "/repos/{}/actions/workflows/{}/runs?status=failure&branch={}&per_page={}",
        filter.repository(),
        utf8_percent_encode(filter.workflow_file(), COMPONENT),
        utf8_percent_encode(filter.branch(), COMPONENT),
        filter.max_runs()
    )
}

/// Jobs of the latest attempt of a run.
pub fn run_jobs_path(repository: &str, run_id: u64) -> String {
    format!(
        "/repos/{}/actions/runs/{}/jobs?filter=latest&per_page={}",
        repository, run_id, JOBS_PER_PAGE
    )
}

/// Plain-text log of a job.
pub fn job_log_path(repository: &str, job_id: u64) -> String {
    format!("/repos/{}/actions/jobs/{}/logs", repository, job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_runs_path() {
        let filter = RunFilter::new("owner/repo", "ci.yml", "develop", 3).unwrap();
        assert_eq!(
            failed_runs_path(&filter),
            "/repos/owner/repo/actions/workflows/ci.yml/runs?status=failure&branch=develop&per_page=3"
        );
    }

    #[test]
    fn test_failed_runs_path_encodes_branch_and_workflow() {
        let cases = [
            ("fix#12", "ci.yml", "ci.yml", "fix%2312"),
            ("deps/a+b", "ci.yml", "ci.yml", "deps%2Fa%2Bb"),
            ("feature/a b&c=d", "ci.yml", "ci.yml", "feature%2Fa%20b%26c%3Dd"),
            ("release-1.2_x~y", "my tests.yml", "my%20tests.yml", "release-1.2_x~y"),
        ];

        for (branch, workflow, encoded_workflow, encoded_branch) in cases {
            let filter = RunFilter::new("owner/repo", workflow, branch, 5).unwrap();
            assert_eq!(
                failed_runs_path(&filter),
                format!(
                    "/repos/owner/repo/actions/workflows/{encoded_workflow}/runs?status=failure&branch={encoded_branch}&per_page=5"
                ),
                "branch: {branch:?}"
            );
        }
    }

    #[test]
    fn test_run_jobs_path() {
        assert_eq!(
            run_jobs_path("owner/repo", 42),
            "/repos/owner/repo/actions/runs/42/jobs?filter=latest&per_page=100"
        );
    }

    #[test]
    fn test_job_log_path() {
        assert_eq!(
            job_log_path("owner/repo", 20),
            "/repos/owner/repo/actions/jobs/20/logs"
        );
    }
}
