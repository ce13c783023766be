//! Release Publisher
//!
//! Writes the annotated tag, its ref and the release for a resolved version. The release
//! body ends with the metadata trailer that the locator reads back on the next run.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::{SourceControlConfig, TaggerConfig};
use crate::domain::{ClassifiedCommit, Commit, ReleaseMetadata, TagPattern, Version, Workspace};
use crate::error::{ReleaseError, Result};
use crate::github::{NewRelease, NewTag, RemoteRepository, Tagger};

/// What a publish produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRelease {
    pub tag: String,
    /// Release page URL; the tag name on a dry run
    pub url: String,
    /// Hash of the tagged commit
    pub target_sha: String,
    /// Cutoff recorded in the trailer
    pub last_commit: DateTime<Utc>,
}

pub struct ReleasePublisher<'a> {
    remote: &'a dyn RemoteRepository,
    tagger: &'a TaggerConfig,
    dry_run: bool,
}

impl<'a> ReleasePublisher<'a> {
    pub fn new(remote: &'a dyn RemoteRepository, tagger: &'a TaggerConfig, dry_run: bool) -> Self {
        ReleasePublisher {
            remote,
            tagger,
            dry_run,
        }
    }

    /// Tag the newest commit and create the release
    ///
    /// # Arguments
    /// * `workspace` - Workspace being released
    /// * `config` - Tag and release name templates
    /// * `version` - Version of the new release
    /// * `classified` - Commits included in the release, in any order
    ///
    /// # Returns
    /// * `Ok(PublishedRelease)` - Tag and release exist (or would, on a dry run)
    /// * `Err(ReleaseError::PublishWrite)` - A write failed; an already created tag is kept
    pub async fn publish(
        &self,
        workspace: &Workspace,
        config: &SourceControlConfig,
        version: Version,
        classified: &[ClassifiedCommit],
    ) -> Result<PublishedRelease> {
        let target = newest_commit(classified)
            .ok_or_else(|| ReleaseError::publish("no commits to release"))?;

        let tag = TagPattern::new(config.tag_pattern.as_str())?.render(&version);
        let name = TagPattern::new(config.release_pattern.as_str())?.render(&version);
        let metadata = ReleaseMetadata::new(workspace.id.clone(), target.timestamp, version);
        let body = format!("{}\n{}\n", render_changelog(classified), metadata.encode());

        let published = PublishedRelease {
            tag: tag.clone(),
            url: tag.clone(),
            target_sha: target.sha.clone(),
            last_commit: target.timestamp,
        };

        if self.dry_run {
            info!("Dry run: would tag {} as '{}'", target.short_sha(), tag);
            debug!("Dry run release body:\n{}", body);
            return Ok(published);
        }

        let new_tag = NewTag {
            tag: tag.clone(),
            message: name.clone(),
            tagger: Tagger {
                name: self.tagger.name.clone(),
                email: self.tagger.email.clone(),
                date: Utc::now(),
            },
            object_type: "commit".to_string(),
            object: target.sha.clone(),
        };

        let tag_sha = self
            .remote
            .create_tag(&new_tag)
            .await
            .map_err(|e| ReleaseError::publish(format!("creating tag '{}': {}", tag, e)))?;
        debug!("Created tag object {} for '{}'", tag_sha, tag);

        let reference = format!("refs/tags/{}", tag);
        self.remote
            .create_ref(&reference, &tag_sha)
            .await
            .map_err(|e| ReleaseError::publish(format!("creating ref '{}': {}", reference, e)))?;

        let release = NewRelease {
            tag_name: tag.clone(),
            target_commitish: workspace.branch.clone(),
            name,
            body,
            draft: false,
            prerelease: false,
            generate_release_notes: false,
        };

        let created = self.remote.create_release(&release).await.map_err(|e| {
            ReleaseError::publish(format!(
                "creating release for '{}': {} (tag '{}' was created and left in place)",
                tag, e, tag
            ))
        })?;

        info!("Published {} for '{}'", tag, workspace.id);
        Ok(PublishedRelease {
            url: created.html_url,
            ..published
        })
    }
}

/// The commit to tag: newest timestamp, ties broken by the smallest hash
fn newest_commit(classified: &[ClassifiedCommit]) -> Option<&Commit> {
    classified
        .iter()
        .map(|c| &c.commit)
        .min_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.sha.cmp(&b.sha)))
}

/// Changelog grouped by title, titles in first-seen order
pub fn render_changelog(classified: &[ClassifiedCommit]) -> String {
    let mut groups: Vec<(&str, Vec<&Commit>)> = Vec::new();
    for entry in classified {
        match groups.iter_mut().find(|(title, _)| *title == entry.title) {
            Some((_, commits)) => commits.push(&entry.commit),
            None => groups.push((entry.title.as_str(), vec![&entry.commit])),
        }
    }

    let mut out = String::new();
    for (title, commits) in groups {
        out.push_str(&format!("## {}\n\n", title));
        for commit in commits {
            out.push_str(&format!("- {} ({})\n", commit.subject(), commit.short_sha()));
        }
        out.push('\n');
    }
    out
}
