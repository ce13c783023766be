use chrono::{DateTime, Utc};

/// Link from a commit to one of its parents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitParent {
    pub sha: String,
    /// API URL that resolves to the parent commit
    pub url: String,
}

/// A commit as fetched from the remote repository API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Paths of files changed by this commit, relative to the repository root
    pub files: Vec<String>,
    /// Ordered parents; the first one is the linear ancestor
    pub parents: Vec<CommitParent>,
}

impl Commit {
    /// The first-parent link, absent on a root commit
    pub fn first_parent(&self) -> Option<&CommitParent> {
        self.parents.first()
    }

    /// First line of the commit message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }

    /// Abbreviated hash for display
    pub fn short_sha(&self) -> &str {
        if self.sha.len() > 7 {
            &self.sha[..7]
        } else {
            &self.sha
        }
    }
}

/// A commit annotated with the changelog title it was classified under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCommit {
    pub commit: Commit,
    pub title: String,
}
