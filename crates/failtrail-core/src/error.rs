//! Error types for failtrail-core
//!
//! Discovery itself never fails: absent or malformed responses degrade to
//! "no contribution". These errors cover the edges around it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when constructing a [`crate::RunFilter`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Repository is not of the form `owner/name`
    #[error("Invalid repository '{0}': expected 'owner/name'")]
    InvalidRepository(String),

    /// Workflow file name is empty
    #[error("Workflow file name must not be empty")]
    EmptyWorkflow,

    /// Branch name is empty
    #[error("Branch name must not be empty")]
    EmptyBranch,

    /// Run count is zero
    #[error("Maximum run count must be at least 1")]
    ZeroMaxRuns,
}

/// Errors raised while resolving the run context from the CI environment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// No repository was given and none could be read from the environment
    #[error("Repository is not set (pass --repository or set GITHUB_REPOSITORY)")]
    MissingRepository,

    /// No workflow file was given and none could be derived from the environment
    #[error("Workflow file is not set (pass --workflow or set GITHUB_WORKFLOW_REF)")]
    MissingWorkflow,

    /// The resolved values do not form a valid filter
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Errors raised by the workflow output sink
#[derive(Error, Debug)]
pub enum OutputError {
    /// Output file could not be opened or appended to
    #[error("Failed to write output file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Console writer failed
    #[error("Failed to write to console: {0}")]
    Console(#[from] std::io::Error),
}

/// Errors raised when running the test command
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Base command is blank
    #[error("Test command is empty")]
    EmptyCommand,

    /// Shell could not be spawned
    #[error("Failed to spawn test command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
