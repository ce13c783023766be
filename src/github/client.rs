//! GitHub REST API client

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{NewRelease, NewTag, Release, RemoteRepository, TagRef};
use crate::config::{ApiConfig, RepositoryConfig};
use crate::domain::{Commit, CommitParent};
use crate::error::{ReleaseError, Result};

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("release-toolkit/", env!("CARGO_PKG_VERSION"));

/// Backoff applied to idempotent requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Calculate delay for given attempt number
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        std::cmp::min(Duration::from_millis(delay_ms as u64), self.max_delay)
    }
}

/// [RemoteRepository] backed by the GitHub REST API
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl GitHubClient {
    /// Create a client, reading the token from the configured environment variable
    pub fn new(repository: &RepositoryConfig, api: &ApiConfig) -> Result<Self> {
        let token = std::env::var(&api.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty());
        if token.is_none() {
            warn!(
                "{} is not set; requests are unauthenticated and writes will be rejected",
                api.token_env
            );
        }
        Self::with_token(repository, api, token)
    }

    /// Create a client with an explicit token
    pub fn with_token(
        repository: &RepositoryConfig,
        api: &ApiConfig,
        token: Option<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ReleaseError::config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            owner: repository.owner.clone(),
            repo: repository.repo.clone(),
            token,
            retry: RetryPolicy {
                max_retries: api.max_retries,
                initial_delay: Duration::from_millis(api.retry_delay_ms),
                ..RetryPolicy::default()
            },
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_url, self.owner, self.repo, path
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// GET with retries on network errors, 429 and 5xx
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            debug!("HTTP GET: {} {:?}", url, query);
            let result = self.send(self.request(Method::GET, url).query(query), url).await;

            match result {
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.retry.max_retries,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// POST once; writes are not idempotent so they are never retried
    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!("HTTP POST: {}", url);
        self.send(self.request(Method::POST, url).json(body), url).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ReleaseError::request(None, format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            return Err(ReleaseError::request(
                Some(status.as_u16()),
                format!("{} returned {}: {}", url, status, message),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            ReleaseError::request(
                Some(status.as_u16()),
                format!("{}: invalid response body: {}", url, e),
            )
        })
    }
}

#[async_trait]
impl RemoteRepository for GitHubClient {
    async fn list_tags(&self, page: u32, per_page: u32) -> Result<Vec<TagRef>> {
        let tags: Vec<TagResponse> = self
            .get_json(
                &self.repo_url("/tags"),
                &[("per_page", per_page.to_string()), ("page", page.to_string())],
            )
            .await?;

        Ok(tags
            .into_iter()
            .map(|t| TagRef {
                name: t.name,
                commit_sha: t.commit.sha,
            })
            .collect())
    }

    async fn list_releases(&self, page: u32, per_page: u32) -> Result<Vec<Release>> {
        self.get_json(
            &self.repo_url("/releases"),
            &[("per_page", per_page.to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn get_commit(&self, sha: &str) -> Result<Commit> {
        let commit: CommitResponse = self
            .get_json(&self.repo_url(&format!("/commits/{}", sha)), &[])
            .await?;
        commit.try_into()
    }

    async fn get_commit_by_url(&self, url: &str) -> Result<Commit> {
        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        };
        let commit: CommitResponse = self.get_json(&url, &[]).await?;
        commit.try_into()
    }

    async fn get_branch_head(&self, branch: &str) -> Result<Commit> {
        self.get_commit(branch).await
    }

    async fn latest_commit_for_path(
        &self,
        branch: &str,
        path: Option<&str>,
    ) -> Result<Option<Commit>> {
        let mut query = vec![("sha", branch.to_string()), ("per_page", "1".to_string())];
        if let Some(path) = path {
            query.push(("path", path.to_string()));
        }

        let commits: Vec<CommitResponse> =
            self.get_json(&self.repo_url("/commits"), &query).await?;
        commits.into_iter().next().map(Commit::try_from).transpose()
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<String> {
        let created: ObjectResponse = self.post_json(&self.repo_url("/git/tags"), tag).await?;
        Ok(created.sha)
    }

    async fn create_ref(&self, reference: &str, sha: &str) -> Result<()> {
        let body = NewRef {
            reference: reference.to_string(),
            sha: sha.to_string(),
        };
        let _: serde_json::Value = self.post_json(&self.repo_url("/git/refs"), &body).await?;
        Ok(())
    }

    async fn create_release(&self, release: &NewRelease) -> Result<Release> {
        self.post_json(&self.repo_url("/releases"), release).await
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Deserialize)]
struct ObjectResponse {
    sha: String,
}

#[derive(Deserialize)]
struct TagResponse {
    name: String,
    commit: ObjectResponse,
}

#[derive(Serialize)]
struct NewRef {
    #[serde(rename = "ref")]
    reference: String,
    sha: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
    #[serde(default)]
    files: Vec<FileResponse>,
    #[serde(default)]
    parents: Vec<ParentResponse>,
}

#[derive(Deserialize)]
struct CommitDetail {
    #[serde(default)]
    author: Option<SignatureResponse>,
    #[serde(default)]
    committer: Option<SignatureResponse>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct SignatureResponse {
    #[serde(default)]
    date: Option<String>,
}

#[derive(Deserialize)]
struct FileResponse {
    filename: String,
}

#[derive(Deserialize)]
struct ParentResponse {
    sha: String,
    #[serde(default)]
    url: Option<String>,
}

impl TryFrom<CommitResponse> for Commit {
    type Error = ReleaseError;

    fn try_from(response: CommitResponse) -> Result<Self> {
        let raw_date = response
            .commit
            .author
            .and_then(|s| s.date)
            .or_else(|| response.commit.committer.and_then(|s| s.date))
            .ok_or_else(|| {
                ReleaseError::walk(format!("commit {} has no timestamp", response.sha))
            })?;

        let timestamp = DateTime::parse_from_rfc3339(&raw_date)
            .map_err(|e| {
                ReleaseError::walk(format!(
                    "commit {} has malformed timestamp '{}': {}",
                    response.sha, raw_date, e
                ))
            })?
            .with_timezone(&Utc);

        let parents = response
            .parents
            .into_iter()
            .map(|p| match p.url {
                Some(url) => Ok(CommitParent { sha: p.sha, url }),
                None => Err(ReleaseError::walk(format!(
                    "commit {} lists parent {} without a url",
                    response.sha, p.sha
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Commit {
            sha: response.sha,
            timestamp,
            message: response.commit.message,
            files: response.files.into_iter().map(|f| f.filename).collect(),
            parents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_calculation() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(20), Duration::from_secs(30));
    }

    #[test]
    fn test_commit_conversion_prefers_author_date() {
        let response: CommitResponse = serde_json::from_value(serde_json::json!({
            "sha": "53df6d85a3f9015ef416f968331d33dbeeab135d",
            "commit": {
                "author": { "date": "2024-07-02T19:08:58Z" },
                "committer": { "date": "2024-07-03T10:00:00Z" },
                "message": "chore(): show create new version"
            },
            "files": [{ "filename": "src/index.txt" }],
            "parents": [{
                "sha": "ac500ae1ed612653cc9e9f35a813d1d67260707d",
                "url": "https://api.github.com/repos/o/r/commits/ac500ae"
            }]
        }))
        .unwrap();

        let commit = Commit::try_from(response).unwrap();
        assert_eq!(commit.timestamp.to_rfc3339(), "2024-07-02T19:08:58+00:00");
        assert_eq!(commit.files, vec!["src/index.txt".to_string()]);
        assert_eq!(
            commit.first_parent().unwrap().sha,
            "ac500ae1ed612653cc9e9f35a813d1d67260707d"
        );
    }

    #[test]
    fn test_commit_conversion_rejects_malformed_timestamp() {
        let response: CommitResponse = serde_json::from_value(serde_json::json!({
            "sha": "abc",
            "commit": { "author": { "date": "not a date" }, "message": "x" }
        }))
        .unwrap();

        let err = Commit::try_from(response).unwrap_err();
        assert!(err.to_string().contains("malformed timestamp"));
    }

    #[test]
    fn test_commit_conversion_rejects_parent_without_url() {
        let response: CommitResponse = serde_json::from_value(serde_json::json!({
            "sha": "abc",
            "commit": { "author": { "date": "2024-07-02T19:08:58Z" }, "message": "x" },
            "parents": [{ "sha": "def" }]
        }))
        .unwrap();

        assert!(Commit::try_from(response).is_err());
    }
}
