use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info_span, Instrument};

use super::{RunContext, RunLog};
use crate::analyzer::VersionResolver;
use crate::config::{CommitPattern, PluginConfig, TaggerConfig};
use crate::domain::Workspace;
use crate::error::Result;
use crate::github::RemoteRepository;
use crate::plugins::{PackagePlugin, PackagePublisher, PluginInvocation, SourceControlPlugin};

/// Options shared by every workspace of a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Compute releases without writing anything remote
    pub dry_run: bool,
    /// Directory workspace paths are relative to
    pub root: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            dry_run: false,
            root: PathBuf::from("."),
        }
    }
}

/// Progress of one workspace run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceState {
    Pending,
    SourceControlDone { success: bool },
    PluginsRun,
    Finished,
}

/// Everything a workspace run produced
#[derive(Debug, Clone)]
pub struct WorkspaceReport {
    pub workspace_id: String,
    pub context: RunContext,
    pub log: RunLog,
    /// States visited, in order
    pub states: Vec<WorkspaceState>,
}

impl WorkspaceReport {
    fn new(workspace_id: &str) -> Self {
        WorkspaceReport {
            workspace_id: workspace_id.to_string(),
            context: RunContext::new(),
            log: RunLog::new(workspace_id),
            states: vec![WorkspaceState::Pending],
        }
    }

    fn transition(&mut self, state: WorkspaceState) {
        debug!("Workspace '{}': {:?}", self.workspace_id, state);
        self.states.push(state);
    }

    pub fn state(&self) -> WorkspaceState {
        self.states.last().copied().unwrap_or(WorkspaceState::Pending)
    }
}

/// Runs the configured plugins of each workspace, in order
pub struct PipelineRunner {
    remote: Arc<dyn RemoteRepository>,
    packages: Arc<dyn PackagePublisher>,
    resolver: VersionResolver,
    tagger: TaggerConfig,
    options: RunOptions,
}

impl PipelineRunner {
    pub fn new(
        remote: Arc<dyn RemoteRepository>,
        packages: Arc<dyn PackagePublisher>,
        patterns: &[CommitPattern],
        tagger: TaggerConfig,
        options: RunOptions,
    ) -> Result<Self> {
        Ok(PipelineRunner {
            remote,
            packages,
            resolver: VersionResolver::new(patterns)?,
            tagger,
            options,
        })
    }

    /// Run every plugin of `workspace`.
    ///
    /// Plugin failures are recorded in the report; this never fails.
    pub async fn run_workspace(&self, workspace: &Workspace) -> WorkspaceReport {
        let span = info_span!("workspace", id = %workspace.id);
        self.run_plugins(workspace).instrument(span).await
    }

    async fn run_plugins(&self, workspace: &Workspace) -> WorkspaceReport {
        let mut report = WorkspaceReport::new(&workspace.id);
        let source_control = SourceControlPlugin::new(
            self.remote.as_ref(),
            &self.resolver,
            &self.tagger,
            self.options.dry_run,
        );
        let packages = PackagePlugin::new(
            self.packages.as_ref(),
            &self.options.root,
            self.options.dry_run,
        );

        for invocation in PluginInvocation::for_workspace(workspace) {
            debug!("Running plugin '{}'", invocation.name());
            match invocation.plugin {
                PluginConfig::SourceControl(config) => {
                    let success = source_control
                        .execute(workspace, config, &mut report.context, &mut report.log)
                        .await;
                    report.transition(WorkspaceState::SourceControlDone { success });
                }
                PluginConfig::PackagePublish(config) => {
                    packages
                        .execute_publish(workspace, config, &report.context, &mut report.log)
                        .await;
                }
                PluginConfig::PackageMirror(config) => {
                    packages
                        .execute_mirror(workspace, config, &report.context, &mut report.log)
                        .await;
                }
            }
        }

        report.transition(WorkspaceState::PluginsRun);
        report.transition(WorkspaceState::Finished);
        report
    }

    /// Run workspaces one after another
    pub async fn run_all(&self, workspaces: &[Workspace]) -> Vec<WorkspaceReport> {
        let mut reports = Vec::with_capacity(workspaces.len());
        for workspace in workspaces {
            reports.push(self.run_workspace(workspace).await);
        }
        reports
    }
}
