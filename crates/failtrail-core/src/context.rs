//! GitHub Actions run context.
//!
//! Reads the ambient CI environment once, at the process boundary, and turns
//! it into an immutable [`RunFilter`]. Nothing below this module touches the
//! environment.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::RunFilter;
use crate::error::ContextError;

/// Branch searched when the environment names none.
pub const DEFAULT_BRANCH: &str = "main";

/// Default number of recent failed runs to inspect.
pub const DEFAULT_MAX_RUNS: u32 = 5;

fn workflow_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/([^/]+\.ya?ml)@").expect("workflow ref pattern is a valid regex"))
}

/// Snapshot of the Actions environment variables failtrail cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionContext {
    head_ref: Option<String>,
    ref_name: Option<String>,
    workflow_ref: Option<String>,
    repository: Option<String>,
}

/// Explicit values that take precedence over the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOverrides {
    pub repository: Option<String>,
    pub workflow_file: Option<String>,
    pub branch: Option<String>,
    pub max_runs: u32,
}

impl Default for FilterOverrides {
    fn default() -> Self {
        Self {
            repository: None,
            workflow_file: None,
            branch: None,
            max_runs: DEFAULT_MAX_RUNS,
        }
    }
}

impl ActionContext {
    /// Read the context from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the context through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            head_ref: read("GITHUB_HEAD_REF"),
            ref_name: read("GITHUB_REF_NAME"),
            workflow_ref: read("GITHUB_WORKFLOW_REF"),
            repository: read("GITHUB_REPOSITORY"),
        }
    }

    /// Branch whose history should be searched.
    ///
    /// On `pull_request` events `GITHUB_HEAD_REF` holds the PR branch while
    /// `GITHUB_REF_NAME` is the ephemeral merge ref (`250/merge`), which has
    /// no run history. Push events only set `GITHUB_REF_NAME`.
    pub fn branch(&self) -> &str {
        self.head_ref
            .as_deref()
            .or(self.ref_name.as_deref())
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// Workflow file name from `GITHUB_WORKFLOW_REF`
    /// (`owner/repo/.github/workflows/main.yml@refs/heads/main` → `main.yml`).
    pub fn workflow_file(&self) -> Option<&str> {
        let workflow_ref = self.workflow_ref.as_deref()?;
        workflow_file_regex()
            .captures(workflow_ref)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Repository slug from `GITHUB_REPOSITORY`.
    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    /// Build the run filter, preferring explicit overrides to the environment.
    pub fn resolve_filter(&self, overrides: FilterOverrides) -> Result<RunFilter, ContextError> {
        let repository = overrides
            .repository
            .filter(|s| !s.is_empty())
            .or_else(|| self.repository().map(str::to_string))
            .ok_or(ContextError::MissingRepository)?;
        let workflow_file = overrides
            .workflow_file
            .filter(|s| !s.is_empty())
            .or_else(|| self.workflow_file().map(str::to_string))
            .ok_or(ContextError::MissingWorkflow)?;
        let branch = overrides
            .branch
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.branch().to_string());

        Ok(RunFilter::new(
            repository,
            workflow_file,
            branch,
            overrides.max_runs,
        )?)
    }
}
