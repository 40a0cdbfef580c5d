//! failtrail - re-run only the tests that failed recently
//!
//! Searches the recent failed runs of a GitHub Actions workflow for PHPUnit
//! failures and hands them to the test runner as a `--filter`.
//!
//! ## Commands
//!
//! - `find`: list previously failed tests and publish them as step outputs
//! - `run`: run the test command restricted to previously failed tests

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use failtrail_core::context::DEFAULT_MAX_RUNS;
use failtrail_core::{
    filter_expression, ActionContext, ActionOutput, DiscoveryResult, FailedTestFinder,
    FilterOverrides, TestCommand,
};
use failtrail_github::{GitHubClient, GitHubConfig, DEFAULT_API_URL};
use tracing::{info, warn, Level};

/// Step output holding the `--filter` expression.
const OUTPUT_FAILED_TESTS: &str = "failed-tests";
/// Step output holding the number of failed tests found.
const OUTPUT_COUNT: &str = "count";

#[derive(Parser)]
#[command(name = "failtrail")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find tests that failed in recent CI runs and re-run only those", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tests that failed in recent runs
    Find {
        #[command(flatten)]
        source: SourceArgs,

        /// How to print the result on stdout
        #[arg(long, value_enum, default_value_t = Format::Lines)]
        format: Format,
    },

    /// Run the test command filtered to tests that failed in recent runs
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Test runner invocation
        #[arg(long, default_value = "vendor/bin/phpunit")]
        command: String,

        /// Extra arguments appended verbatim
        #[arg(long, allow_hyphen_values = true)]
        args: Option<String>,

        /// Exit non-zero instead of running the full suite when nothing is found
        #[arg(long)]
        fail_when_empty: bool,
    },
}

/// Where to look for failed runs.
#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// GitHub token used for API access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API root
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Repository slug (default: $GITHUB_REPOSITORY)
    #[arg(long)]
    repository: Option<String>,

    /// Workflow file name (default: derived from $GITHUB_WORKFLOW_REF)
    #[arg(long)]
    workflow: Option<String>,

    /// Branch to search (default: $GITHUB_HEAD_REF, $GITHUB_REF_NAME, then "main")
    #[arg(long)]
    branch: Option<String>,

    /// Maximum number of recent failed runs to inspect
    #[arg(long, default_value_t = DEFAULT_MAX_RUNS, value_parser = clap::value_parser!(u32).range(1..))]
    max_runs: u32,

    /// Number of runs inspected at once
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,
}

impl SourceArgs {
    fn overrides(&self) -> FilterOverrides {
        FilterOverrides {
            repository: self.repository.clone(),
            workflow_file: self.workflow.clone(),
            branch: self.branch.clone(),
            max_runs: self.max_runs,
        }
    }

    fn github_config(&self) -> GitHubConfig {
        let config = GitHubConfig::default()
            .with_base_url(&self.api_url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        match self.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => config.with_token(token),
            None => config,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One identifier per line inside a log group
    Lines,
    /// JSON array of identifiers
    Json,
    /// The `--filter` expression only
    Filter,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    failtrail_core::init_tracing(cli.json, level);

    let mut output = ActionOutput::from_env();

    match cli.command {
        Commands::Find { source, format } => {
            let found = discover(&source, &ActionContext::from_env()).await?;
            cmd_find(&found, format, &mut output)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            source,
            command,
            args,
            fail_when_empty,
        } => {
            let found = discover(&source, &ActionContext::from_env()).await?;
            let code = cmd_run(&found, &command, args.as_deref(), fail_when_empty, &mut output).await?;
            Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
        }
    }
}

/// Resolve the run filter and search the run history.
async fn discover(source: &SourceArgs, context: &ActionContext) -> Result<DiscoveryResult> {
    let filter = context
        .resolve_filter(source.overrides())
        .context("Failed to resolve which runs to search")?;
    let client = GitHubClient::new(source.github_config()).context("Failed to create GitHub client")?;

    info!(
        repository = filter.repository(),
        workflow = filter.workflow_file(),
        branch = filter.branch(),
        max_runs = filter.max_runs(),
        "Searching for previously failed tests"
    );

    Ok(FailedTestFinder::new(client)
        .with_concurrency(usize::from(source.concurrency))
        .find(&filter)
        .await)
}

/// Publish step outputs for the discovered tests.
fn publish_outputs<W: Write>(found: &DiscoveryResult, output: &mut ActionOutput<W>) -> Result<()> {
    let filter = filter_expression(found.as_slice()).unwrap_or_default();
    output
        .set(OUTPUT_FAILED_TESTS, &filter)
        .context("Failed to write step output")?;
    output
        .set(OUTPUT_COUNT, &found.len().to_string())
        .context("Failed to write step output")?;
    Ok(())
}

/// List previously failed tests
fn cmd_find<W: Write>(
    found: &DiscoveryResult,
    format: Format,
    output: &mut ActionOutput<W>,
) -> Result<()> {
    publish_outputs(found, output)?;

    match format {
        Format::Lines => {
            output.group(&format!("Previously failed tests ({})", found.len()))?;
            if found.is_empty() {
                output.log("No previously failed tests found")?;
            }
            for test in found {
                output.log(test)?;
            }
            output.end_group()?;
        }
        Format::Json => {
            output.log(&serde_json::to_string(found)?)?;
        }
        Format::Filter => {
            output.log(&filter_expression(found.as_slice()).unwrap_or_default())?;
        }
    }
    Ok(())
}

/// Run the test command restricted to previously failed tests
async fn cmd_run<W: Write>(
    found: &DiscoveryResult,
    command: &str,
    args: Option<&str>,
    fail_when_empty: bool,
    output: &mut ActionOutput<W>,
) -> Result<i32> {
    publish_outputs(found, output)?;

    let mut test_command = TestCommand::new(command);
    match filter_expression(found.as_slice()) {
        Some(filter) => {
            output.group(&format!("Re-running {} previously failed test(s)", found.len()))?;
            for test in found {
                output.log(test)?;
            }
            output.end_group()?;
            test_command = test_command.with_filter(filter);
        }
        None if fail_when_empty => {
            warn!("No previously failed tests found");
            output.log("No previously failed tests found")?;
            return Ok(1);
        }
        None => {
            output.log("No previously failed tests found; running the full suite")?;
        }
    }

    if let Some(args) = args {
        test_command = test_command.with_args(args);
    }

    test_command
        .run()
        .await
        .context("Failed to run the test command")
}
