//! Plugins run for each workspace, in configured order
//!
//! - `github`: the source-control plugin, which releases the workspace
//! - `npm`: publishes the workspace package at the released version
//! - `npm:mirroring`: publishes the same package under another name

pub mod npm;
pub mod package;
pub mod source_control;

pub use npm::NpmPublisher;
pub use package::{MirrorRequest, PackagePlugin, PackagePublisher, PackageRequest};
pub use source_control::{SourceControlOutcome, SourceControlPlugin};

use crate::config::PluginConfig;
use crate::domain::Workspace;

/// A workspace paired with one of its plugin configurations
#[derive(Debug, Clone, Copy)]
pub struct PluginInvocation<'a> {
    pub workspace: &'a Workspace,
    pub plugin: &'a PluginConfig,
}

impl<'a> PluginInvocation<'a> {
    /// One invocation per configured plugin, in declaration order
    pub fn for_workspace(workspace: &'a Workspace) -> impl Iterator<Item = PluginInvocation<'a>> {
        workspace
            .plugins
            .iter()
            .map(move |plugin| PluginInvocation { workspace, plugin })
    }

    pub fn name(&self) -> &'static str {
        self.plugin.name()
    }
}
