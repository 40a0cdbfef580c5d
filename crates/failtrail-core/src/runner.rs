//! Test command construction and execution.

use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::info;

use crate::error::RunnerError;

/// PHPUnit `--filter` expression matching any of `tests`.
///
/// Identifiers are regex-escaped (namespace backslashes double up) and
/// joined with `|`. Returns `None` for an empty list.
pub fn filter_expression<S: AsRef<str>>(tests: &[S]) -> Option<String> {
    if tests.is_empty() {
        return None;
    }
    Some(
        tests
            .iter()
            .map(|test| regex::escape(test.as_ref()))
            .collect::<Vec<_>>()
            .join("|"),
    )
}

/// A test-runner invocation with an optional filter and extra arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    command: String,
    filter: Option<String>,
    args: Option<String>,
}

impl TestCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            filter: None,
            args: None,
        }
    }

    /// Restrict the run with `--filter`. Empty values are ignored.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into()).filter(|f| !f.is_empty());
        self
    }

    /// Append extra arguments verbatim. Empty values are ignored.
    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = Some(args.into()).filter(|a| !a.is_empty());
        self
    }

    /// Full shell command line for the host platform.
    pub fn build(&self) -> String {
        self.build_for(std::path::MAIN_SEPARATOR, escape_shell_arg)
    }

    fn build_for(&self, separator: char, escape: fn(&str) -> String) -> String {
        let mut parts = vec![normalize_program(&self.command, separator)];

        if let Some(filter) = &self.filter {
            parts.push(format!("--filter {}", escape(filter)));
        }

        if let Some(args) = &self.args {
            parts.push(args.clone());
        }

        parts.join(" ")
    }

    /// Run through the platform shell with inherited stdio and return the
    /// exit code (`-1` when terminated by a signal).
    pub async fn run(&self) -> Result<i32, RunnerError> {
        if self.command.trim().is_empty() {
            return Err(RunnerError::EmptyCommand);
        }

        let line = self.build();
        let start = Instant::now();
        info!(command = %line, "Running tests");

        let status = shell(&line)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| RunnerError::Spawn {
                command: line.clone(),
                source,
            })?;

        let exit_code = status.code().unwrap_or(-1);
        info!(
            exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            "Test command finished"
        );
        Ok(exit_code)
    }
}

#[cfg(windows)]
fn shell(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

#[cfg(not(windows))]
fn shell(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

/// Rewrite `/` in the program token (everything before the first space) to
/// the host separator.
fn normalize_program(command: &str, separator: char) -> String {
    if separator == '/' {
        return command.to_string();
    }
    match command.split_once(' ') {
        Some((program, rest)) => format!("{} {}", program.replace('/', &separator.to_string()), rest),
        None => command.replace('/', &separator.to_string()),
    }
}

/// Quote a single argument for the host shell.
pub fn escape_shell_arg(arg: &str) -> String {
    if cfg!(windows) {
        escape_windows(arg)
    } else {
        escape_posix(arg)
    }
}

/// Single-quote for POSIX shells; embedded quotes become `'\''`.
fn escape_posix(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Double-quote for `cmd.exe`; characters it would expand are blanked.
fn escape_windows(arg: &str) -> String {
    let cleaned: String = arg
        .chars()
        .map(|c| if matches!(c, '"' | '%' | '!') { ' ' } else { c })
        .collect();
    format!("\"{cleaned}\"")
}
