//! Commit History Walker
//!
//! Follows first-parent links backward from the branch head, one request at a time,
//! until the boundary cutoff is crossed. The walk is bounded by time only: an
//! irrelevant commit never stops it, since a relevant one may lie further back.
//! Path relevance is applied to the collected chain afterwards.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{Commit, Workspace};
use crate::error::{ReleaseError, Result};
use crate::github::RemoteRepository;

/// Commits of one walk, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedRange {
    /// Branch head at the time of the walk
    pub head_sha: String,
    /// Commits newer than the cutoff that touch the workspace
    pub commits: Vec<Commit>,
}

pub struct CommitWalker<'a> {
    remote: &'a dyn RemoteRepository,
}

impl<'a> CommitWalker<'a> {
    pub fn new(remote: &'a dyn RemoteRepository) -> Self {
        CommitWalker { remote }
    }

    /// Collect the commits of `workspace` strictly newer than `cutoff`, newest first.
    ///
    /// # Errors
    /// Any remote failure or malformed commit aborts the whole walk with
    /// [ReleaseError::Walk]; no partial list is returned.
    pub async fn collect(
        &self,
        workspace: &Workspace,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Commit>> {
        Ok(self.collect_range(workspace, cutoff).await?.commits)
    }

    /// Same as [CommitWalker::collect], also reporting the head the walk started from
    pub async fn collect_range(
        &self,
        workspace: &Workspace,
        cutoff: DateTime<Utc>,
    ) -> Result<WalkedRange> {
        let head = self
            .remote
            .get_branch_head(&workspace.branch)
            .await
            .map_err(into_walk_error)?;
        let head_sha = head.sha.clone();
        let chain = self.walk(head, cutoff).await.map_err(into_walk_error)?;
        let walked = chain.len();

        let commits: Vec<Commit> = chain
            .into_iter()
            .filter(|commit| workspace.is_touched_by(commit))
            .collect();

        debug!(
            "Walked {} commits on '{}', {} touch '{}'",
            walked,
            workspace.branch,
            commits.len(),
            workspace.id
        );
        Ok(WalkedRange { head_sha, commits })
    }

    async fn walk(&self, head: Commit, cutoff: DateTime<Utc>) -> Result<Vec<Commit>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = head;

        while cursor.timestamp > cutoff {
            if !visited.insert(cursor.sha.clone()) {
                return Err(ReleaseError::walk(format!(
                    "commit {} revisited; parent chain is cyclic",
                    cursor.sha
                )));
            }

            let parent_url = cursor.first_parent().map(|parent| parent.url.clone());
            chain.push(cursor);

            match parent_url {
                Some(url) => cursor = self.remote.get_commit_by_url(&url).await?,
                None => break,
            }
        }

        Ok(chain)
    }
}

fn into_walk_error(err: ReleaseError) -> ReleaseError {
    match err {
        ReleaseError::Walk(_) => err,
        other => ReleaseError::walk(other.to_string()),
    }
}
