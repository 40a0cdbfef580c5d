//! Previously failed test discovery.
//!
//! Walks runs → jobs → logs through a [`HistoryClient`]. Every request is
//! isolated: a missing run listing, job listing or log only removes its own
//! contribution, so discovery always yields a (possibly empty) result.

use std::collections::BTreeSet;

use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{DiscoveryResult, Job, RunFilter, TestIdentifier, WorkflowRun};
use crate::history::{failed_runs_path, job_log_path, run_jobs_path, HistoryClient};
use crate::log_parser::LogParser;

/// Finds tests that failed in recent runs of a workflow.
pub struct FailedTestFinder<C> {
    client: C,
    parser: LogParser,
    concurrency: usize,
}

impl<C: HistoryClient> FailedTestFinder<C> {
    /// Create a finder that walks runs one at a time.
    pub fn new(client: C) -> Self {
        Self {
            client,
            parser: LogParser::new(),
            concurrency: 1,
        }
    }

    /// Inspect up to `concurrency` runs at once (minimum 1).
    ///
    /// The result does not depend on this setting.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Unique failed test identifiers across the filter's recent failed
    /// runs, sorted ascending.
    pub async fn find(&self, filter: &RunFilter) -> DiscoveryResult {
        let runs = self.failed_runs(filter).await;
        if runs.is_empty() {
            info!(
                workflow = filter.workflow_file(),
                branch = filter.branch(),
                "No failed runs found"
            );
            return DiscoveryResult::default();
        }

        info!(
            runs = runs.len(),
            workflow = filter.workflow_file(),
            branch = filter.branch(),
            "Inspecting failed runs"
        );

        let mut found = BTreeSet::new();
        let mut per_run = stream::iter(runs)
            .map(|run| self.run_failures(filter.repository(), run))
            .buffered(self.concurrency);

        while let Some(tests) = per_run.next().await {
            found.extend(tests);
        }

        info!(tests = found.len(), "Discovery complete");
        DiscoveryResult::from(found)
    }

    async fn failed_runs(&self, filter: &RunFilter) -> Vec<WorkflowRun> {
        let path = failed_runs_path(filter);
        let Some(body) = self.client.fetch_json(&path).await else {
            warn!(%path, "Run listing unavailable");
            return Vec::new();
        };

        let Some(mut runs) = decode_entries::<WorkflowRun>(&body, "workflow_runs") else {
            warn!(%path, "Run listing has no workflow_runs array");
            return Vec::new();
        };

        runs.truncate(filter.max_runs() as usize);
        runs
    }

    /// Unique identifiers from every failed job of one run.
    async fn run_failures(&self, repository: &str, run: WorkflowRun) -> BTreeSet<TestIdentifier> {
        let path = run_jobs_path(repository, run.id);
        let Some(body) = self.client.fetch_json(&path).await else {
            warn!(run_id = run.id, "Job listing unavailable; skipping run");
            return BTreeSet::new();
        };

        let Some(jobs) = decode_entries::<Job>(&body, "jobs") else {
            warn!(run_id = run.id, "Job listing has no jobs array; skipping run");
            return BTreeSet::new();
        };

        let mut tests = BTreeSet::new();
        for job in jobs.iter().filter(|job| job.is_failure()) {
            let path = job_log_path(repository, job.id);
            match self.client.fetch_raw(&path).await {
                Some(log) => {
                    let extracted = self.parser.extract(&log);
                    debug!(
                        run_id = run.id,
                        job_id = job.id,
                        log_bytes = log.len(),
                        tests = extracted.len(),
                        "Parsed job log"
                    );
                    tests.extend(extracted);
                }
                None => warn!(run_id = run.id, job_id = job.id, "Job log unavailable; skipping job"),
            }
        }
        tests
    }
}

/// Decode `body[key]` as an array of `T`, dropping entries that don't fit.
///
/// Returns `None` when the container itself is missing or not an array.
fn decode_entries<T: DeserializeOwned>(body: &Value, key: &str) -> Option<Vec<T>> {
    let entries = body.get(key)?.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| match <T as Deserialize>::deserialize(entry) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(key, error = %e, "Skipping malformed entry");
                    None
                }
            })
            .collect(),
    )
}
