//! failtrail core - previously failed test discovery
//!
//! Provides the discovery pipeline that:
//! - Lists recent failed workflow runs for a branch
//! - Fetches the logs of the failed jobs in those runs
//! - Extracts failed test identifiers from the console output
//! - Returns them deduplicated and sorted, ready to feed a test filter
//!
//! The remote CI provider is reached only through the [`HistoryClient`]
//! capability, so any transport (or the in-memory fake) can drive it.

pub mod context;
pub mod domain;
pub mod error;
pub mod fakes;
pub mod finder;
pub mod history;
pub mod log_parser;
pub mod output;
pub mod runner;
pub mod telemetry;

// Re-export key types
pub use context::{ActionContext, FilterOverrides};
pub use domain::{DiscoveryResult, Job, RunFilter, TestIdentifier, WorkflowRun};
pub use error::{ContextError, FilterError, OutputError, RunnerError};
pub use finder::FailedTestFinder;
pub use history::HistoryClient;
pub use log_parser::LogParser;
pub use output::ActionOutput;
pub use runner::{filter_expression, TestCommand};
pub use telemetry::init_tracing;

/// failtrail version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
