use crate::domain::{TagPattern, VersionBump};
use crate::error::{ReleaseError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File names searched in the working directory when no path is given
pub const CONFIG_FILE_NAMES: [&str; 2] = ["release-toolkit.toml", "release-toolkit.json"];

/// Remediation hint printed when configuration cannot be loaded
pub const CONFIG_HINT: &str = "Create a release-toolkit.toml in the repository root with \
     a [repository] table, [[commit_patterns]] entries and [[workspaces]] entries.";

/// Represents the complete configuration for release-toolkit.
///
/// Contains the target repository, commit patterns and the workspaces to release.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub tagger: TaggerConfig,

    #[serde(default, alias = "commitPatterns")]
    pub commit_patterns: Vec<CommitPattern>,

    #[serde(default)]
    pub workspaces: Vec<WorkspaceConfig>,
}

/// Owner and name of the remote repository.
///
/// Accepts either a table (`{ owner, repo }`) or a clone URL in https or ssh form.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub owner: String,
    pub repo: String,
}

impl RepositoryConfig {
    /// Parse `https://github.com/owner/repo(.git)` or `git@github.com:owner/repo(.git)`
    pub fn from_url(url: &str) -> Result<Self> {
        let path = match url.strip_prefix("git@") {
            Some(rest) => rest.split_once(':').map(|(_, path)| path),
            None => url
                .split_once("://")
                .and_then(|(_, rest)| rest.split_once('/'))
                .map(|(_, path)| path),
        };
        let path = path
            .ok_or_else(|| ReleaseError::config(format!("Unrecognized repository URL: {}", url)))?;

        let mut parts = path.trim_end_matches('/').splitn(2, '/');
        let owner = parts.next().unwrap_or_default();
        let repo = parts.next().unwrap_or_default().trim_end_matches(".git");

        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(ReleaseError::config(format!(
                "Repository URL '{}' does not name an owner and repository",
                url
            )));
        }

        Ok(RepositoryConfig {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl<'de> Deserialize<'de> for RepositoryConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Url(String),
            Parts { owner: String, repo: String },
        }

        match Raw::deserialize(deserializer)? {
            Raw::Url(url) => RepositoryConfig::from_url(&url).map_err(serde::de::Error::custom),
            Raw::Parts { owner, repo } => Ok(RepositoryConfig { owner, repo }),
        }
    }
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

/// Remote API access settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            token_env: default_token_env(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_tagger_name() -> String {
    "release-toolkit".to_string()
}

fn default_tagger_email() -> String {
    "release-toolkit@users.noreply.github.com".to_string()
}

/// Identity recorded on annotated tags
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TaggerConfig {
    #[serde(default = "default_tagger_name")]
    pub name: String,

    #[serde(default = "default_tagger_email")]
    pub email: String,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        TaggerConfig {
            name: default_tagger_name(),
            email: default_tagger_email(),
        }
    }
}

/// Returns the changelog title for commits without a more specific one.
pub fn default_title() -> String {
    "Default".to_string()
}

/// A commit-message pattern and the bump it implies
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CommitPattern {
    pub pattern: String,

    pub upgrade: VersionBump,

    #[serde(default = "default_title")]
    pub title: String,
}

/// One workspace entry as written in the configuration file
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WorkspaceConfig {
    /// Identity recorded in release trailers; defaults to the folder path
    #[serde(default)]
    pub id: String,

    #[serde(alias = "folderPath")]
    pub folder_path: String,

    pub branch: String,

    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

impl WorkspaceConfig {
    /// The configured id, or the folder path when none is given
    pub fn identity(&self) -> &str {
        if self.id.trim().is_empty() {
            self.folder_path.trim()
        } else {
            self.id.trim()
        }
    }
}

/// Plugin name of the source-control (GitHub) plugin
pub const GITHUB_PLUGIN_NAME: &str = "github";
/// Plugin name of the package-publish plugin
pub const NPM_PUBLISH_PLUGIN_NAME: &str = "npm";
/// Plugin name of the package-mirror plugin
pub const NPM_MIRROR_PLUGIN_NAME: &str = "npm:mirroring";

/// Plugin configuration, tagged by the plugin `name`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "name")]
pub enum PluginConfig {
    #[serde(rename = "github")]
    SourceControl(SourceControlConfig),

    #[serde(rename = "npm")]
    PackagePublish(PackagePublishConfig),

    #[serde(rename = "npm:mirroring")]
    PackageMirror(PackageMirrorConfig),
}

impl PluginConfig {
    pub fn name(&self) -> &'static str {
        match self {
            PluginConfig::SourceControl(_) => GITHUB_PLUGIN_NAME,
            PluginConfig::PackagePublish(_) => NPM_PUBLISH_PLUGIN_NAME,
            PluginConfig::PackageMirror(_) => NPM_MIRROR_PLUGIN_NAME,
        }
    }
}

fn default_version_template() -> String {
    "{version}".to_string()
}

/// How the previous release of a workspace is located
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryMode {
    /// Scan release bodies for this workspace's metadata trailer
    #[default]
    ReleaseBody,
    /// Scan tags whose name matches the tag template
    Tags,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceControlConfig {
    #[serde(default = "default_version_template", alias = "tagPattern")]
    pub tag_pattern: String,

    #[serde(default = "default_version_template", alias = "releasePattern")]
    pub release_pattern: String,

    #[serde(default)]
    pub boundary: BoundaryMode,
}

impl Default for SourceControlConfig {
    fn default() -> Self {
        SourceControlConfig {
            tag_pattern: default_version_template(),
            release_pattern: default_version_template(),
            boundary: BoundaryMode::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PackagePublishConfig {
    #[serde(default, alias = "dryRun")]
    pub dry_run: bool,

    /// Publish under a dist-tag; not supported yet and rejected at publish time
    #[serde(default)]
    pub tag: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PackageMirrorConfig {
    #[serde(alias = "packageName")]
    pub package_name: String,

    /// Shell command run in the workspace folder before mirroring
    #[serde(default)]
    pub pre: Option<String>,

    #[serde(default, alias = "dryRun")]
    pub dry_run: bool,
}

impl Config {
    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.repository.owner.trim().is_empty() || self.repository.repo.trim().is_empty() {
            return Err(ReleaseError::config(
                "repository owner and repo must not be empty",
            ));
        }

        for pattern in &self.commit_patterns {
            Regex::new(&pattern.pattern).map_err(|e| {
                ReleaseError::config(format!("Invalid commit pattern '{}': {}", pattern.pattern, e))
            })?;
        }

        let mut seen = HashSet::new();
        for workspace in &self.workspaces {
            let id = workspace.identity();
            if id.is_empty() {
                return Err(ReleaseError::config(
                    "workspace needs an id or a folder_path",
                ));
            }
            if !seen.insert(id) {
                return Err(ReleaseError::config(format!(
                    "Duplicate workspace id '{}'",
                    id
                )));
            }

            for plugin in &workspace.plugins {
                if let PluginConfig::SourceControl(sc) = plugin {
                    for template in [&sc.tag_pattern, &sc.release_pattern] {
                        TagPattern::new(template.as_str()).map_err(|e| {
                            ReleaseError::config(format!("workspace '{}': {}", id, e))
                        })?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Parse configuration text; `.json` paths are read as JSON, everything else as TOML.
pub fn parse_config(content: &str, path: &Path) -> Result<Config> {
    let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(content)
            .map_err(|e| ReleaseError::config(format!("{}: {}", path.display(), e)))?,
        _ => toml::from_str(content)
            .map_err(|e| ReleaseError::config(format!("{}: {}", path.display(), e)))?,
    };

    config.validate()?;
    Ok(config)
}

/// Locates the configuration file.
///
/// Search order:
/// 1. Custom path provided as parameter
/// 2. `release-toolkit.toml` then `release-toolkit.json` in the current directory
/// 3. `release-toolkit.toml` in the user config directory
pub fn find_config_path(config_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
        return Err(ReleaseError::config(format!(
            "Release toolkit configuration file cannot be found on {}",
            path.display()
        )));
    }

    for name in CONFIG_FILE_NAMES {
        let candidate = PathBuf::from(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let candidate = config_dir.join(CONFIG_FILE_NAMES[0]);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(ReleaseError::config(format!(
        "Release toolkit configuration file cannot be found \
         (looked for {} in the current directory)",
        CONFIG_FILE_NAMES.join(" and ")
    )))
}

/// Loads and validates configuration.
///
/// # Arguments
/// * `config_path` - Optional path to a custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded configuration
/// * `Err(ReleaseError::Config)` - If no file is found, or it cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = find_config_path(config_path)?;
    let content = fs::read_to_string(&path)
        .map_err(|e| ReleaseError::config(format!("{}: {}", path.display(), e)))?;
    parse_config(&content, &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_from_https_url() {
        let repo = RepositoryConfig::from_url("https://github.com/acme/platform.git").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.repo, "platform");
    }

    #[test]
    fn test_repository_from_ssh_url() {
        let repo = RepositoryConfig::from_url("git@github.com:acme/platform.git").unwrap();
        assert_eq!(
            repo,
            RepositoryConfig {
                owner: "acme".to_string(),
                repo: "platform".to_string()
            }
        );
    }

    #[test]
    fn test_repository_from_bad_url() {
        assert!(RepositoryConfig::from_url("platform").is_err());
        assert!(RepositoryConfig::from_url("https://github.com/acme").is_err());
    }

    #[test]
    fn test_plugin_names() {
        assert_eq!(
            PluginConfig::SourceControl(SourceControlConfig::default()).name(),
            "github"
        );
        assert_eq!(
            PluginConfig::PackagePublish(PackagePublishConfig::default()).name(),
            "npm"
        );
    }

    #[test]
    fn test_api_defaults() {
        let api = ApiConfig::default();
        assert_eq!(api.base_url, "https://api.github.com");
        assert_eq!(api.token_env, "GITHUB_TOKEN");
        assert_eq!(api.max_retries, 3);
    }
}
