//! Commit-message lint, usable as a `commit-msg` hook

use std::path::Path;

use crate::analyzer::VersionResolver;
use crate::config::CommitPattern;
use crate::error::{ReleaseError, Result};

/// Result of linting one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintResult {
    Accepted,
    /// No pattern matched; carries the report shown to the committer
    Rejected(String),
}

impl LintResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, LintResult::Accepted)
    }
}

/// Check a commit message against the configured patterns
pub fn lint_message(message: &str, patterns: &[CommitPattern]) -> Result<LintResult> {
    let resolver = VersionResolver::new(patterns)?;
    if resolver.matches_any(message) {
        return Ok(LintResult::Accepted);
    }

    let listed = patterns
        .iter()
        .map(|p| p.pattern.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    Ok(LintResult::Rejected(format!(
        "Commit did not fit any of the provided patterns \"{}\".\n\nCommit message:\n  {}",
        listed,
        message.trim_end()
    )))
}

/// Lint the message stored in `path`, e.g. `.git/COMMIT_EDITMSG`
pub fn lint_file(path: &Path, patterns: &[CommitPattern]) -> Result<LintResult> {
    let message = std::fs::read_to_string(path).map_err(|e| {
        ReleaseError::config(format!("Cannot read commit message {}: {}", path.display(), e))
    })?;
    lint_message(&message, patterns)
}
