use crate::domain::Version;
use chrono::{DateTime, Utc};
use std::fmt;

/// Where a boundary was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryOrigin {
    /// A tag matching the workspace's tag template
    Tag(String),
    /// A release whose body carries this workspace's metadata trailer
    Release(String),
    /// Derived from the newest commit touching the workspace, for a first release
    Synthetic,
}

/// End of the previous release of a workspace
///
/// Commits strictly newer than `cutoff` belong to the next release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBoundary {
    pub workspace_id: String,
    pub previous_version: Version,
    pub cutoff: DateTime<Utc>,
    pub origin: BoundaryOrigin,
}

impl ReleaseBoundary {
    pub fn is_synthetic(&self) -> bool {
        self.origin == BoundaryOrigin::Synthetic
    }
}

impl fmt::Display for ReleaseBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.origin {
            BoundaryOrigin::Tag(tag) => format!("tag '{}'", tag),
            BoundaryOrigin::Release(tag) => format!("release '{}'", tag),
            BoundaryOrigin::Synthetic => "first release".to_string(),
        };
        write!(
            f,
            "{} @ {} ({})",
            self.previous_version,
            self.cutoff.to_rfc3339(),
            source
        )
    }
}

/// Warnings raised while locating a boundary.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No commit newer than the boundary on the branch
    NoNewCommits {
        previous_version: Version,
        head_sha: String,
    },
    /// Tag matches the template but its version cannot be parsed
    UnparsableTag { tag: String, reason: String },
    /// Release carries this workspace's trailer but no usable cutoff timestamp
    MissingCutoff { tag: String },
    /// Release carries this workspace's trailer but no version could be determined
    MissingVersion { tag: String },
    /// No commit on the branch touches the workspace path
    NoPathHistory { path: String, branch: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoNewCommits {
                previous_version,
                head_sha,
            } => {
                let short_hash = if head_sha.len() > 7 {
                    &head_sha[..7]
                } else {
                    head_sha.as_str()
                };
                write!(
                    f,
                    "No new commits since version {} (head: {})",
                    previous_version, short_hash
                )
            }
            BoundaryWarning::UnparsableTag { tag, reason } => {
                write!(f, "Cannot parse tag '{}': {}", tag, reason)
            }
            BoundaryWarning::MissingCutoff { tag } => {
                write!(f, "Release '{}' has no readable last-commit entry, skipped", tag)
            }
            BoundaryWarning::MissingVersion { tag } => {
                write!(f, "Release '{}' has no readable version, skipped", tag)
            }
            BoundaryWarning::NoPathHistory { path, branch } => {
                let path = if path.is_empty() { "." } else { path.as_str() };
                write!(f, "No commit on '{}' touches '{}'", branch, path)
            }
        }
    }
}
