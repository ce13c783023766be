//! Command orchestration
//!
//! Wires configuration, the remote client and the pipeline runner together, keeping
//! clap out of the workflow so it can be driven programmatically.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{self, Config, CONFIG_HINT};
use crate::domain::Workspace;
use crate::error::ReleaseError;
use crate::github::{GitHubClient, RemoteRepository};
use crate::lint::{self, LintResult};
use crate::pipeline::{PipelineRunner, RunOptions, WorkspaceReport};
use crate::plugins::{NpmPublisher, PackagePublisher};
use crate::ui;

/// Printed when the configuration lists no workspace
pub const NO_WORKSPACES_MESSAGE: &str =
    "No workspaces found, please add \"workspaces\" property in your release toolkit file.";

/// Arguments of the `release` command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseArgs {
    /// Path to custom config file
    pub config_path: Option<String>,

    /// Compute releases without writing anything remote
    pub dry_run: bool,
}

/// Load configuration, reporting failures with a remediation hint
fn load(config_path: Option<&str>) -> Result<Config> {
    config::load_config(config_path).map_err(|e| {
        ui::display_error(&e.to_string());
        ui::display_status(CONFIG_HINT);
        anyhow::Error::new(e)
    })
}

/// The `release` command: load configuration and release every workspace
///
/// # Returns
/// * `Ok(reports)` - One report per workspace; empty when none is configured
/// * `Err` - Configuration could not be loaded or the client could not be built
pub async fn run_release(args: ReleaseArgs) -> Result<Vec<WorkspaceReport>> {
    let config = load(args.config_path.as_deref())?;

    let remote = GitHubClient::new(&config.repository, &config.api)
        .map_err(|e| {
            ui::display_error(&e.to_string());
            e
        })
        .context("Failed to create GitHub client")?;
    let options = RunOptions {
        dry_run: args.dry_run,
        ..RunOptions::default()
    };

    match run_workspaces(&config, Arc::new(remote), Arc::new(NpmPublisher::new()), options).await {
        Err(ReleaseError::NoWorkspaces) => {
            ui::display_warning(NO_WORKSPACES_MESSAGE);
            Ok(Vec::new())
        }
        other => Ok(other?),
    }
}

/// Run the pipeline over every configured workspace, printing a summary after each
pub async fn run_workspaces(
    config: &Config,
    remote: Arc<dyn RemoteRepository>,
    packages: Arc<dyn PackagePublisher>,
    options: RunOptions,
) -> crate::Result<Vec<WorkspaceReport>> {
    if config.workspaces.is_empty() {
        return Err(ReleaseError::NoWorkspaces);
    }

    if options.dry_run {
        ui::display_status("Dry run: no tag, release or package will be written");
    }

    let runner = PipelineRunner::new(
        remote,
        packages,
        &config.commit_patterns,
        config.tagger.clone(),
        options,
    )?;

    let mut reports = Vec::with_capacity(config.workspaces.len());
    for workspace in config.workspaces.iter().map(Workspace::from) {
        info!("Releasing workspace '{}'", workspace.id);
        let report = runner.run_workspace(&workspace).await;
        ui::display_summary(&report.log);
        if let Some(url) = report.context.release_url() {
            info!("Released '{}': {}", report.workspace_id, url);
        }
        if let Some(error) = report.context.error() {
            ui::display_error(&format!("{}: {}", report.workspace_id, error));
        }
        reports.push(report);
    }
    Ok(reports)
}

/// The `commit-lint` command
///
/// # Returns
/// * `Ok(true)` - The message matches a configured pattern
/// * `Ok(false)` - It does not; the report has been printed
pub fn run_commit_lint(config_path: Option<&str>, message_file: &Path) -> Result<bool> {
    let config = load(config_path)?;

    match lint::lint_file(message_file, &config.commit_patterns)? {
        LintResult::Accepted => Ok(true),
        LintResult::Rejected(report) => {
            ui::display_lint_rejection(&report);
            Ok(false)
        }
    }
}
