//! Failed test extraction from PHPUnit console output.
//!
//! PHPUnit lists every failure as a numbered entry:
//!
//! ```text
//! There were 2 failures:
//!
//! 1) Acme\Tests\FooTest::testSomething
//! Failed asserting that false is true.
//!
//! 2) Acme\Tests\BarTest::testOtherThing
//! ```
//!
//! The parser returns the identifiers in log order and keeps duplicates;
//! deduplication happens in [`crate::FailedTestFinder`].

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::TestIdentifier;

/// Numbered failure marker followed by a `Qualified\Name::method` token
/// that ends at ASCII whitespace or end of input.
const FAILURE_PATTERN: &str =
    r"[0-9]+\)(?-u:\s)+([A-Za-z0-9_\\]+::[A-Za-z0-9_]+)(?:(?-u:\s)|$)";

fn failure_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FAILURE_PATTERN).expect("failure pattern is a valid regex"))
}

/// Stateless extractor for failed test identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogParser;

impl LogParser {
    pub fn new() -> Self {
        Self
    }

    /// Extract every failed test identifier from a raw log, in order of
    /// appearance, duplicates included.
    pub fn extract(&self, log: &str) -> Vec<TestIdentifier> {
        failure_regex()
            .captures_iter(log)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
