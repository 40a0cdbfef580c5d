//! Discovery domain types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// A failed test identifier of the form `Qualified\Name::method`.
pub type TestIdentifier = String;

/// Conclusion value that marks a job as failed.
pub const FAILURE_CONCLUSION: &str = "failure";

/// Which runs to inspect.
///
/// Immutable once built; the constructor validates every field so the
/// discovery core never has to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFilter {
    repository: String,
    workflow_file: String,
    branch: String,
    max_runs: u32,
}

impl RunFilter {
    /// Create a validated run filter.
    pub fn new(
        repository: impl Into<String>,
        workflow_file: impl Into<String>,
        branch: impl Into<String>,
        max_runs: u32,
    ) -> Result<Self, FilterError> {
        let repository = repository.into();
        let workflow_file = workflow_file.into();
        let branch = branch.into();

        if !is_repository_slug(&repository) {
            return Err(FilterError::InvalidRepository(repository));
        }
        if workflow_file.trim().is_empty() {
            return Err(FilterError::EmptyWorkflow);
        }
        if branch.trim().is_empty() {
            return Err(FilterError::EmptyBranch);
        }
        if max_runs == 0 {
            return Err(FilterError::ZeroMaxRuns);
        }

        Ok(Self {
            repository,
            workflow_file,
            branch,
            max_runs,
        })
    }

    /// Repository slug (`owner/name`).
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Workflow file name (e.g. `ci.yml`).
    pub fn workflow_file(&self) -> &str {
        &self.workflow_file
    }

    /// Branch whose history is searched.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Maximum number of recent failed runs to inspect.
    pub fn max_runs(&self) -> u32 {
        self.max_runs
    }
}

fn is_repository_slug(s: &str) -> bool {
    match s.split_once('/') {
        Some((owner, name)) => !owner.is_empty() && !name.is_empty() && !name.contains('/'),
        None => false,
    }
}

/// One entry of the run listing. Only the id is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
}

/// One entry of a run's job listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Job {
    pub id: u64,

    /// Terminal status; `None` while the job is still running.
    #[serde(default)]
    pub conclusion: Option<String>,
}

impl Job {
    /// Whether this job's log should be fetched.
    pub fn is_failure(&self) -> bool {
        self.conclusion.as_deref() == Some(FAILURE_CONCLUSION)
    }
}

/// Unique failed test identifiers, sorted ascending by byte order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiscoveryResult(Vec<TestIdentifier>);

impl DiscoveryResult {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[TestIdentifier] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestIdentifier> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<TestIdentifier> {
        self.0
    }
}

impl From<BTreeSet<TestIdentifier>> for DiscoveryResult {
    fn from(set: BTreeSet<TestIdentifier>) -> Self {
        // BTreeSet iterates in ascending order with no duplicates
        Self(set.into_iter().collect())
    }
}

impl FromIterator<TestIdentifier> for DiscoveryResult {
    fn from_iter<I: IntoIterator<Item = TestIdentifier>>(iter: I) -> Self {
        iter.into_iter().collect::<BTreeSet<_>>().into()
    }
}

impl<'a> IntoIterator for &'a DiscoveryResult {
    type Item = &'a TestIdentifier;
    type IntoIter = std::slice::Iter<'a, TestIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl PartialEq<Vec<&str>> for DiscoveryResult {
    fn eq(&self, other: &Vec<&str>) -> bool {
        self.0.len() == other.len() && self.0.iter().zip(other).all(|(a, b)| a == b)
    }
}
