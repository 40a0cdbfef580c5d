//! GitHub Actions step outputs and log markers.

use std::fs::OpenOptions;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};

use crate::error::OutputError;

/// Writes step outputs to `$GITHUB_OUTPUT` and workflow markers to the
/// console.
#[derive(Debug)]
pub struct ActionOutput<W = Stdout> {
    output_file: Option<PathBuf>,
    console: W,
}

impl ActionOutput<Stdout> {
    /// Outputs go to `output_file` (if any); markers go to stdout.
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self::with_writer(output_file, io::stdout())
    }

    /// Outputs go to the file named by `GITHUB_OUTPUT`, when set.
    pub fn from_env() -> Self {
        let output_file = std::env::var_os("GITHUB_OUTPUT")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::new(output_file)
    }
}

impl<W: Write> ActionOutput<W> {
    pub fn with_writer(output_file: Option<PathBuf>, console: W) -> Self {
        Self {
            output_file,
            console,
        }
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }

    /// Append `name=value` to the output file. No-op outside Actions.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), OutputError> {
        let Some(path) = &self.output_file else {
            return Ok(());
        };

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{name}={value}"))
            .map_err(|source| OutputError::File {
                path: path.clone(),
                source,
            })
    }

    /// Print a line to the console.
    pub fn log(&mut self, message: &str) -> Result<(), OutputError> {
        writeln!(self.console, "{message}")?;
        Ok(())
    }

    /// Open a collapsible log group.
    pub fn group(&mut self, name: &str) -> Result<(), OutputError> {
        writeln!(self.console, "::group::{name}")?;
        Ok(())
    }

    /// Close the current log group.
    pub fn end_group(&mut self) -> Result<(), OutputError> {
        writeln!(self.console, "::endgroup::")?;
        Ok(())
    }

    pub fn into_writer(self) -> W {
        self.console
    }
}
