//! Release Locator
//!
//! Finds where the previous release of a workspace ended. Several workspaces may share
//! one repository, so the search is never "the latest release" but "the latest release
//! that belongs to this workspace".

use chrono::Duration;
use tracing::{debug, warn};

use crate::boundary::{BoundaryOrigin, BoundaryWarning, ReleaseBoundary};
use crate::config::{BoundaryMode, SourceControlConfig};
use crate::domain::{ReleaseMetadata, TagPattern, Version, Workspace};
use crate::error::{ReleaseError, Result};
use crate::github::{RemoteRepository, PAGE_SIZE};

/// How far a synthetic cutoff is moved before the seed commit, so that the strict
/// "newer than cutoff" comparison of the walker keeps that commit
const SYNTHETIC_CUTOFF_OFFSET_MS: i64 = 5;

pub struct ReleaseLocator<'a> {
    remote: &'a dyn RemoteRepository,
}

impl<'a> ReleaseLocator<'a> {
    pub fn new(remote: &'a dyn RemoteRepository) -> Self {
        ReleaseLocator { remote }
    }

    /// Find the boundary of the previous release of `workspace`.
    ///
    /// # Returns
    /// * `Ok(Some(boundary))` - A previous release was found
    /// * `Ok(None)` - The workspace has never been released
    /// * `Err(ReleaseError::BoundaryLookup)` - The remote API failed
    pub async fn locate(
        &self,
        workspace: &Workspace,
        config: &SourceControlConfig,
    ) -> Result<Option<ReleaseBoundary>> {
        let pattern = TagPattern::new(config.tag_pattern.as_str())?;
        debug!(
            "Locating boundary of '{}' by {:?} with template '{}'",
            workspace.id,
            config.boundary,
            pattern.as_str()
        );

        let found = match config.boundary {
            BoundaryMode::Tags => self.locate_by_tag(workspace, &pattern).await,
            BoundaryMode::ReleaseBody => self.locate_by_release(workspace, &pattern).await,
        };
        found.map_err(into_lookup_error)
    }

    /// Walk tag pages newest first and take the first tag matching the template
    async fn locate_by_tag(
        &self,
        workspace: &Workspace,
        pattern: &TagPattern,
    ) -> Result<Option<ReleaseBoundary>> {
        let mut page = 1;
        loop {
            let tags = self.remote.list_tags(page, PAGE_SIZE).await?;
            debug!("Tag page {}: {} entries", page, tags.len());

            for tag in &tags {
                if !pattern.matches(&tag.name) {
                    continue;
                }
                let Some(version) = pattern.extract_version(&tag.name) else {
                    warn!(
                        "{}",
                        BoundaryWarning::UnparsableTag {
                            tag: tag.name.clone(),
                            reason: "version component out of range".to_string(),
                        }
                    );
                    continue;
                };

                let commit = self.remote.get_commit(&tag.commit_sha).await?;
                return Ok(Some(ReleaseBoundary {
                    workspace_id: workspace.id.clone(),
                    previous_version: version,
                    cutoff: commit.timestamp,
                    origin: BoundaryOrigin::Tag(tag.name.clone()),
                }));
            }

            if tags.len() < PAGE_SIZE as usize {
                return Ok(None);
            }
            page += 1;
        }
    }

    /// Walk release pages newest first and take the first whose trailer names this workspace
    async fn locate_by_release(
        &self,
        workspace: &Workspace,
        pattern: &TagPattern,
    ) -> Result<Option<ReleaseBoundary>> {
        let mut page = 1;
        loop {
            let releases = self.remote.list_releases(page, PAGE_SIZE).await?;
            debug!("Release page {}: {} entries", page, releases.len());

            for release in &releases {
                let Some(metadata) = release.body.as_deref().and_then(ReleaseMetadata::decode)
                else {
                    continue;
                };
                if metadata.workspace_id != workspace.id {
                    continue;
                }

                let Some(cutoff) = metadata.last_commit else {
                    warn!(
                        "{}",
                        BoundaryWarning::MissingCutoff {
                            tag: release.tag_name.clone()
                        }
                    );
                    continue;
                };
                let Some(version) = metadata
                    .version
                    .or_else(|| pattern.extract_version(&release.tag_name))
                else {
                    warn!(
                        "{}",
                        BoundaryWarning::MissingVersion {
                            tag: release.tag_name.clone()
                        }
                    );
                    continue;
                };

                return Ok(Some(ReleaseBoundary {
                    workspace_id: workspace.id.clone(),
                    previous_version: version,
                    cutoff,
                    origin: BoundaryOrigin::Release(release.tag_name.clone()),
                }));
            }

            if releases.len() < PAGE_SIZE as usize {
                return Ok(None);
            }
            page += 1;
        }
    }

    /// Boundary for a workspace that has never been released.
    ///
    /// The cutoff sits just before the newest commit touching the workspace, which makes
    /// that commit the seed of the first release at version `0.0.0`.
    ///
    /// # Returns
    /// * `Ok(None)` - No commit on the branch touches the workspace
    pub async fn synthetic_boundary(
        &self,
        workspace: &Workspace,
    ) -> Result<Option<ReleaseBoundary>> {
        let seed = self
            .remote
            .latest_commit_for_path(&workspace.branch, workspace.path_filter())
            .await
            .map_err(into_lookup_error)?;

        let Some(seed) = seed else {
            warn!(
                "{}",
                BoundaryWarning::NoPathHistory {
                    path: workspace.path.clone(),
                    branch: workspace.branch.clone(),
                }
            );
            return Ok(None);
        };

        debug!("Seed commit of '{}': {}", workspace.id, seed.short_sha());
        Ok(Some(ReleaseBoundary {
            workspace_id: workspace.id.clone(),
            previous_version: Version::initial(),
            cutoff: seed.timestamp - Duration::milliseconds(SYNTHETIC_CUTOFF_OFFSET_MS),
            origin: BoundaryOrigin::Synthetic,
        }))
    }
}

fn into_lookup_error(err: ReleaseError) -> ReleaseError {
    match err {
        ReleaseError::BoundaryLookup(_) | ReleaseError::Template(_) => err,
        other => ReleaseError::boundary_lookup(other.to_string()),
    }
}
