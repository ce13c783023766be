//! Source-control plugin: locate, walk, resolve, publish

use tracing::{debug, info};

use crate::analyzer::{Resolution, VersionResolver};
use crate::boundary::BoundaryWarning;
use crate::config::{SourceControlConfig, TaggerConfig, GITHUB_PLUGIN_NAME};
use crate::domain::{Version, Workspace};
use crate::error::Result;
use crate::github::RemoteRepository;
use crate::locator::ReleaseLocator;
use crate::pipeline::{RunContext, RunLog};
use crate::publisher::{PublishedRelease, ReleasePublisher};
use crate::walker::{CommitWalker, WalkedRange};

const NO_CHANGES: &str = "No changes found. No action taken";

/// Result of a source-control run that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SourceControlOutcome {
    Released {
        version: Version,
        release: PublishedRelease,
    },
    /// Nothing to release, with the reason when there is one worth reporting
    NoChanges(Option<BoundaryWarning>),
}

pub struct SourceControlPlugin<'a> {
    remote: &'a dyn RemoteRepository,
    resolver: &'a VersionResolver,
    tagger: &'a TaggerConfig,
    dry_run: bool,
}

impl<'a> SourceControlPlugin<'a> {
    pub fn new(
        remote: &'a dyn RemoteRepository,
        resolver: &'a VersionResolver,
        tagger: &'a TaggerConfig,
        dry_run: bool,
    ) -> Self {
        SourceControlPlugin {
            remote,
            resolver,
            tagger,
            dry_run,
        }
    }

    /// Release `workspace` if commits since its previous release warrant it
    pub async fn run(
        &self,
        workspace: &Workspace,
        config: &SourceControlConfig,
    ) -> Result<SourceControlOutcome> {
        let locator = ReleaseLocator::new(self.remote);
        let boundary = match locator.locate(workspace, config).await? {
            Some(boundary) => boundary,
            None => match locator.synthetic_boundary(workspace).await? {
                Some(boundary) => boundary,
                None => {
                    return Ok(SourceControlOutcome::NoChanges(Some(
                        BoundaryWarning::NoPathHistory {
                            path: workspace.path.clone(),
                            branch: workspace.branch.clone(),
                        },
                    )))
                }
            },
        };
        if boundary.is_synthetic() {
            info!("First release of '{}', seeded at {}", workspace.id, boundary);
        } else {
            info!("Previous release of '{}': {}", workspace.id, boundary);
        }

        let WalkedRange { head_sha, commits } = CommitWalker::new(self.remote)
            .collect_range(workspace, boundary.cutoff)
            .await?;
        if commits.is_empty() {
            return Ok(SourceControlOutcome::NoChanges(Some(
                BoundaryWarning::NoNewCommits {
                    previous_version: boundary.previous_version,
                    head_sha,
                },
            )));
        }

        let resolution = self.resolver.resolve(boundary.previous_version, commits)?;
        let (version, classified) = match resolution {
            Resolution::Release {
                version,
                bump,
                classified,
            } => {
                debug!("{} bump over {} commits", bump, classified.len());
                (version, classified)
            }
            Resolution::NoOp { classified } => {
                debug!("{} commits, none bump the version", classified.len());
                return Ok(SourceControlOutcome::NoChanges(None));
            }
        };

        let release = ReleasePublisher::new(self.remote, self.tagger, self.dry_run)
            .publish(workspace, config, version, &classified)
            .await?;

        Ok(SourceControlOutcome::Released { version, release })
    }

    /// Run and record the outcome; never fails the workspace
    pub async fn execute(
        &self,
        workspace: &Workspace,
        config: &SourceControlConfig,
        ctx: &mut RunContext,
        log: &mut RunLog,
    ) -> bool {
        match self.run(workspace, config).await {
            Ok(SourceControlOutcome::Released { version, release }) => {
                let comment = if self.dry_run {
                    "DRY RUN".to_string()
                } else {
                    release.url.clone()
                };
                log.success(
                    GITHUB_PLUGIN_NAME,
                    format!("publish successfully a new version ({})", release.tag),
                    Some(comment),
                );
                ctx.record_release(release.tag, version, release.url);
                true
            }
            Ok(SourceControlOutcome::NoChanges(reason)) => {
                log.skipped(GITHUB_PLUGIN_NAME, NO_CHANGES, reason.map(|r| r.to_string()));
                ctx.record_no_changes();
                false
            }
            Err(e) => {
                log.failure(
                    GITHUB_PLUGIN_NAME,
                    "Github operation failed",
                    Some(format!("Error: {}", e)),
                );
                ctx.record_failure(e.to_string());
                false
            }
        }
    }
}
