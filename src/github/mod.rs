//! Remote repository API abstraction layer
//!
//! All history and all writes go through the remote commit/tag API; nothing is read
//! from a local clone.
//!
//! # Overview
//!
//! The primary abstraction is the [RemoteRepository] trait, which defines the calls the
//! release pipeline needs. The concrete implementations include:
//!
//! - [client::GitHubClient]: the GitHub REST API over `reqwest`
//! - [mock::MockRemote]: an in-memory repository for testing
//!
//! Pipeline code depends on the trait rather than on a concrete client.

pub mod client;
pub mod mock;

pub use client::GitHubClient;
pub use mock::MockRemote;

use crate::domain::Commit;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of entries requested per page when listing tags or releases
pub const PAGE_SIZE: u32 = 100;

/// A tag as returned by the tag listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
    /// Hash of the commit the tag points to
    pub commit_sha: String,
}

/// A published release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

/// Author of an annotated tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tagger {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

/// Request body for creating an annotated tag object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTag {
    pub tag: String,
    pub message: String,
    pub tagger: Tagger,
    #[serde(rename = "type")]
    pub object_type: String,
    /// Hash of the tagged object
    pub object: String,
}

/// Request body for creating a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    pub tag_name: String,
    pub target_commitish: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
    pub generate_release_notes: bool,
}

/// Remote repository operations used by the release pipeline
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync` so a single client can be shared by every
/// workspace run.
///
/// ## Error Handling
///
/// Transport failures surface as [crate::error::ReleaseError::Request] once the
/// implementation's own retry policy is exhausted. Callers add context by wrapping
/// them in the error variant of the pipeline stage that issued the call.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// List tags, newest first
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    /// * `per_page` - Page size
    ///
    /// # Returns
    /// * `Ok(Vec<TagRef>)` - The requested page, empty past the last page
    async fn list_tags(&self, page: u32, per_page: u32) -> Result<Vec<TagRef>>;

    /// List releases, newest first
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    /// * `per_page` - Page size
    async fn list_releases(&self, page: u32, per_page: u32) -> Result<Vec<Release>>;

    /// Fetch a single commit, including changed files and parent links
    async fn get_commit(&self, sha: &str) -> Result<Commit>;

    /// Fetch a commit through an API URL, as found in a parent link
    async fn get_commit_by_url(&self, url: &str) -> Result<Commit>;

    /// Fetch the commit at the head of a branch
    async fn get_branch_head(&self, branch: &str) -> Result<Commit>;

    /// Most recent commit on `branch` that touches `path`
    ///
    /// # Arguments
    /// * `branch` - Branch to search
    /// * `path` - Repository-relative path, or `None` for any commit
    ///
    /// # Returns
    /// * `Ok(Some(Commit))` - The newest matching commit (changed files may be empty)
    /// * `Ok(None)` - If no commit on the branch touches the path
    async fn latest_commit_for_path(&self, branch: &str, path: Option<&str>)
        -> Result<Option<Commit>>;

    /// Create an annotated tag object and return its hash
    async fn create_tag(&self, tag: &NewTag) -> Result<String>;

    /// Create a reference (e.g. `refs/tags/1.2.3`) pointing at `sha`
    async fn create_ref(&self, reference: &str, sha: &str) -> Result<()>;

    /// Create a release and return it as stored by the remote
    async fn create_release(&self, release: &NewRelease) -> Result<Release>;
}
