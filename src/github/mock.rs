use super::{NewRelease, NewTag, Release, RemoteRepository, TagRef};
use crate::domain::{Commit, Workspace};
use crate::error::{ReleaseError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Calls a [MockRemote] can be told to fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    ListTags,
    ListReleases,
    /// Fetching the commit with this hash
    GetCommit(String),
    CreateTag,
    CreateRef,
    CreateRelease,
}

#[derive(Default)]
struct MockState {
    commits: HashMap<String, Commit>,
    branch_heads: HashMap<String, String>,
    /// Newest first
    tags: Vec<TagRef>,
    /// Newest first
    releases: Vec<Release>,
    tag_objects: HashMap<String, NewTag>,
    created_tags: Vec<NewTag>,
    created_refs: Vec<(String, String)>,
    created_releases: Vec<NewRelease>,
    failures: Vec<MockFailure>,
    commit_fetches: usize,
}

/// In-memory remote repository for testing without network access
///
/// Tags and releases are kept newest first: entries added through `add_*` are
/// appended (so add the newest first), entries created through the trait are
/// prepended, the way a real remote lists a fresh release at the top.
#[derive(Default)]
pub struct MockRemote {
    state: Mutex<MockState>,
}

impl MockRemote {
    /// Create a new empty mock remote
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a commit to the mock remote
    pub fn add_commit(&self, commit: Commit) {
        self.state().commits.insert(commit.sha.clone(), commit);
    }

    /// Set a branch head
    pub fn set_branch_head(&self, branch: impl Into<String>, sha: impl Into<String>) {
        self.state().branch_heads.insert(branch.into(), sha.into());
    }

    /// Append a tag, older than every tag already present
    pub fn add_tag(&self, name: impl Into<String>, commit_sha: impl Into<String>) {
        self.state().tags.push(TagRef {
            name: name.into(),
            commit_sha: commit_sha.into(),
        });
    }

    /// Append a release, older than every release already present
    pub fn add_release(&self, release: Release) {
        self.state().releases.push(release);
    }

    /// Make every subsequent matching call fail with a server error
    pub fn fail_on(&self, failure: MockFailure) {
        self.state().failures.push(failure);
    }

    pub fn created_tags(&self) -> Vec<NewTag> {
        self.state().created_tags.clone()
    }

    pub fn created_refs(&self) -> Vec<(String, String)> {
        self.state().created_refs.clone()
    }

    pub fn created_releases(&self) -> Vec<NewRelease> {
        self.state().created_releases.clone()
    }

    /// Number of write calls that succeeded
    pub fn write_count(&self) -> usize {
        let state = self.state();
        state.created_tags.len() + state.created_refs.len() + state.created_releases.len()
    }

    /// Number of single-commit fetches served so far
    pub fn commit_fetches(&self) -> usize {
        self.state().commit_fetches
    }

    fn check(&self, failure: MockFailure) -> Result<()> {
        if self.state().failures.contains(&failure) {
            return Err(ReleaseError::request(
                Some(500),
                format!("injected failure: {:?}", failure),
            ));
        }
        Ok(())
    }

    fn lookup_commit(&self, sha: &str) -> Result<Commit> {
        self.check(MockFailure::GetCommit(sha.to_string()))?;
        let mut state = self.state();
        state.commit_fetches += 1;
        state
            .commits
            .get(sha)
            .cloned()
            .ok_or_else(|| {
                ReleaseError::request(Some(404), format!("No commit found for SHA: {}", sha))
            })
    }
}

fn page<T: Clone>(items: &[T], page: u32, per_page: u32) -> Vec<T> {
    let start = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
    items
        .iter()
        .skip(start)
        .take(per_page as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl RemoteRepository for MockRemote {
    async fn list_tags(&self, page_number: u32, per_page: u32) -> Result<Vec<TagRef>> {
        self.check(MockFailure::ListTags)?;
        Ok(page(&self.state().tags, page_number, per_page))
    }

    async fn list_releases(&self, page_number: u32, per_page: u32) -> Result<Vec<Release>> {
        self.check(MockFailure::ListReleases)?;
        Ok(page(&self.state().releases, page_number, per_page))
    }

    async fn get_commit(&self, sha: &str) -> Result<Commit> {
        self.lookup_commit(sha)
    }

    async fn get_commit_by_url(&self, url: &str) -> Result<Commit> {
        let sha = url.rsplit('/').next().unwrap_or(url);
        self.lookup_commit(sha)
    }

    async fn get_branch_head(&self, branch: &str) -> Result<Commit> {
        let head = self.state().branch_heads.get(branch).cloned();
        match head {
            Some(sha) => self.lookup_commit(&sha),
            None => Err(ReleaseError::request(
                Some(404),
                format!("Branch not found: {}", branch),
            )),
        }
    }

    async fn latest_commit_for_path(
        &self,
        branch: &str,
        path: Option<&str>,
    ) -> Result<Option<Commit>> {
        let state = self.state();
        let filter = Workspace::new("", path.unwrap_or(""), branch, vec![]);

        let Some(head) = state.branch_heads.get(branch).cloned() else {
            return Err(ReleaseError::request(
                Some(404),
                format!("Branch not found: {}", branch),
            ));
        };
        let mut cursor = Some(head);
        let mut steps = 0;
        while let Some(sha) = cursor {
            let Some(commit) = state.commits.get(&sha) else {
                break;
            };
            if filter.is_touched_by(commit) {
                return Ok(Some(commit.clone()));
            }
            cursor = commit.first_parent().map(|p| p.sha.clone());
            steps += 1;
            if steps > state.commits.len() {
                break;
            }
        }
        Ok(None)
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<String> {
        self.check(MockFailure::CreateTag)?;
        let mut state = self.state();
        let sha = format!("tagobject{}", state.tag_objects.len() + 1);
        state.tag_objects.insert(sha.clone(), tag.clone());
        state.created_tags.push(tag.clone());
        Ok(sha)
    }

    async fn create_ref(&self, reference: &str, sha: &str) -> Result<()> {
        self.check(MockFailure::CreateRef)?;
        let mut state = self.state();
        if let Some(name) = reference.strip_prefix("refs/tags/") {
            let commit_sha = state
                .tag_objects
                .get(sha)
                .map(|t| t.object.clone())
                .unwrap_or_else(|| sha.to_string());
            state.tags.insert(
                0,
                TagRef {
                    name: name.to_string(),
                    commit_sha,
                },
            );
        }
        state
            .created_refs
            .push((reference.to_string(), sha.to_string()));
        Ok(())
    }

    async fn create_release(&self, release: &NewRelease) -> Result<Release> {
        self.check(MockFailure::CreateRelease)?;
        let mut state = self.state();
        let stored = Release {
            tag_name: release.tag_name.clone(),
            name: Some(release.name.clone()),
            body: Some(release.body.clone()),
            html_url: format!("https://github.test/releases/tag/{}", release.tag_name),
        };
        state.releases.insert(0, stored.clone());
        state.created_releases.push(release.clone());
        Ok(stored)
    }
}
