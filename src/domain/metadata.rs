//! Machine-readable trailer embedded in release notes
//!
//! Each entry is an HTML comment so it stays invisible in rendered release notes:
//!
//! ```text
//! <!--metadata:v1:workspace-id:start web metadata:v1:workspace-id:end-->
//! ```
//!
//! Decoding tolerates arbitrary prose around the entries, and also reads the
//! unversioned legacy form (`metadata:workdir-id:start ...`) written by earlier
//! releases. Anything that cannot be decoded is reported as absent, never as an error,
//! since release notes may be edited by hand after publication.

use crate::domain::Version;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use std::sync::OnceLock;

const FORMAT_VERSION: &str = "v1";

const WORKSPACE_ID_KEY: &str = "workspace-id";
const LEGACY_WORKSPACE_ID_KEY: &str = "workdir-id";
const LAST_COMMIT_KEY: &str = "last-commit";
const VERSION_KEY: &str = "version";

/// Boundary information carried by a release body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseMetadata {
    pub workspace_id: String,
    /// Timestamp of the newest commit included in the release
    pub last_commit: Option<DateTime<Utc>>,
    pub version: Option<Version>,
}

impl ReleaseMetadata {
    pub fn new(
        workspace_id: impl Into<String>,
        last_commit: DateTime<Utc>,
        version: Version,
    ) -> Self {
        ReleaseMetadata {
            workspace_id: workspace_id.into(),
            last_commit: Some(last_commit),
            version: Some(version),
        }
    }

    /// Render the trailer appended to a release body
    pub fn encode(&self) -> String {
        let mut lines = vec![entry(WORKSPACE_ID_KEY, &self.workspace_id)];
        if let Some(last_commit) = self.last_commit {
            lines.push(entry(
                LAST_COMMIT_KEY,
                &last_commit.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ));
        }
        if let Some(version) = self.version {
            lines.push(entry(VERSION_KEY, &version.to_string()));
        }
        lines.join("\n")
    }

    /// Extract the trailer from a release body.
    ///
    /// Returns `None` when no workspace identity is present. Malformed timestamp or
    /// version entries decode as `None` for that field only.
    pub fn decode(body: &str) -> Option<Self> {
        let fields = entries(body);

        let workspace_id = find(&fields, WORKSPACE_ID_KEY)
            .or_else(|| find(&fields, LEGACY_WORKSPACE_ID_KEY))?
            .to_string();

        let last_commit = find(&fields, LAST_COMMIT_KEY)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let version = find(&fields, VERSION_KEY).and_then(|raw| Version::parse(raw).ok());

        Some(ReleaseMetadata {
            workspace_id,
            last_commit,
            version,
        })
    }
}

fn entry(key: &str, value: &str) -> String {
    format!(
        "<!--metadata:{v}:{key}:start {value} metadata:{v}:{key}:end-->",
        v = FORMAT_VERSION,
        key = key,
        value = value
    )
}

fn entry_regex() -> &'static Regex {
    static ENTRY: OnceLock<Regex> = OnceLock::new();
    ENTRY.get_or_init(|| {
        Regex::new(concat!(
            r"<!--\s*metadata:(?:v\d+:)?([a-z-]+):start\s+(.*?)\s+",
            r"metadata:(?:v\d+:)?([a-z-]+):end\s*-->",
        ))
        .expect("metadata entry regex is valid")
    })
}

/// All well-formed `(key, value)` entries in document order
fn entries(body: &str) -> Vec<(String, String)> {
    entry_regex()
        .captures_iter(body)
        .filter(|caps| caps[1] == caps[3])
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

/// The last entry for `key` wins, so a trailer appended after quoted notes takes precedence
fn find<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    fields
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
