//! Package plugins
//!
//! Run after the source-control plugin and only when it released a new version.
//! Each plugin contains its own failures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::{
    PackageMirrorConfig, PackagePublishConfig, NPM_MIRROR_PLUGIN_NAME, NPM_PUBLISH_PLUGIN_NAME,
};
use crate::domain::{Version, Workspace};
use crate::error::Result;
use crate::pipeline::{RunContext, RunLog};

const NO_ACTION: &str = "No action taken";
const DRY_RUN_COMMENT: &str = "DRY RUN";

/// A request to publish the package in a workspace folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    pub workspace_id: String,
    /// Folder holding the package manifest
    pub folder: PathBuf,
    pub version: Version,
    pub tag: String,
    pub dry_run: bool,
    /// Publish under a dist-tag
    pub dist_tag: bool,
}

impl PackageRequest {
    /// Environment passed to commands run for this request
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("RELEASE_TOOLKIT_WORKSPACE".to_string(), self.workspace_id.clone());
        env.insert("RELEASE_TOOLKIT_VERSION".to_string(), self.version.to_string());
        env.insert("RELEASE_TOOLKIT_TAG".to_string(), self.tag.clone());
        if self.dry_run {
            env.insert("RELEASE_TOOLKIT_DRY_RUN".to_string(), "1".to_string());
        }
        env
    }
}

/// A request to publish a workspace's package under another name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRequest {
    pub package: PackageRequest,
    pub package_name: String,
    /// Shell command run in the folder first
    pub pre: Option<String>,
}

/// Package manager used by the package plugins
#[async_trait]
pub trait PackagePublisher: Send + Sync {
    /// Set the manifest version and publish
    async fn publish(&self, request: &PackageRequest) -> Result<()>;

    /// Run `pre`, rename the manifest, set its version and publish
    async fn mirror(&self, request: &MirrorRequest) -> Result<()>;
}

pub struct PackagePlugin<'a> {
    publisher: &'a dyn PackagePublisher,
    root: &'a Path,
    dry_run: bool,
}

impl<'a> PackagePlugin<'a> {
    /// `root` is the directory workspace paths are relative to
    pub fn new(publisher: &'a dyn PackagePublisher, root: &'a Path, dry_run: bool) -> Self {
        PackagePlugin {
            publisher,
            root,
            dry_run,
        }
    }

    fn request(
        &self,
        workspace: &Workspace,
        ctx: &RunContext,
        version: Version,
        dry_run: bool,
    ) -> PackageRequest {
        PackageRequest {
            workspace_id: workspace.id.clone(),
            folder: self.root.join(&workspace.path),
            version,
            tag: ctx.tag().unwrap_or_default().to_string(),
            dry_run: self.dry_run || dry_run,
            dist_tag: false,
        }
    }

    pub async fn execute_publish(
        &self,
        workspace: &Workspace,
        config: &PackagePublishConfig,
        ctx: &RunContext,
        log: &mut RunLog,
    ) {
        let Some(version) = ctx.released_version() else {
            log.skipped(NPM_PUBLISH_PLUGIN_NAME, NO_ACTION, None);
            return;
        };

        let request = PackageRequest {
            dist_tag: config.tag,
            ..self.request(workspace, ctx, version, config.dry_run)
        };
        let result = self.publisher.publish(&request).await;
        record(log, NPM_PUBLISH_PLUGIN_NAME, version, request.dry_run, result);
    }

    pub async fn execute_mirror(
        &self,
        workspace: &Workspace,
        config: &PackageMirrorConfig,
        ctx: &RunContext,
        log: &mut RunLog,
    ) {
        let Some(version) = ctx.released_version() else {
            log.skipped(NPM_MIRROR_PLUGIN_NAME, NO_ACTION, None);
            return;
        };

        let request = MirrorRequest {
            package: self.request(workspace, ctx, version, config.dry_run),
            package_name: config.package_name.clone(),
            pre: config.pre.clone(),
        };
        let result = self.publisher.mirror(&request).await;
        record(log, NPM_MIRROR_PLUGIN_NAME, version, request.package.dry_run, result);
    }
}

fn record(log: &mut RunLog, plugin: &str, version: Version, dry_run: bool, result: Result<()>) {
    match result {
        Ok(()) => log.success(
            plugin,
            format!("publish successfully a new version ({})", version),
            dry_run.then(|| DRY_RUN_COMMENT.to_string()),
        ),
        Err(e) => log.failure(
            plugin,
            format!("publish failed for ({})", version),
            Some(format!("Error: {}", e)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use crate::pipeline::Outcome;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<PackageRequest>>,
        mirrored: Mutex<Vec<MirrorRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl PackagePublisher for RecordingPublisher {
        async fn publish(&self, request: &PackageRequest) -> Result<()> {
            self.published.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ReleaseError::downstream("npm publish exited with 1"));
            }
            Ok(())
        }

        async fn mirror(&self, request: &MirrorRequest) -> Result<()> {
            self.mirrored.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn released() -> RunContext {
        let mut ctx = RunContext::new();
        ctx.record_release("web-1.4.0", Version::new(1, 4, 0), "u");
        ctx
    }

    #[tokio::test]
    async fn test_publish_skipped_without_release() {
        let publisher = RecordingPublisher::default();
        let mut ctx = RunContext::new();
        ctx.record_no_changes();
        let mut log = RunLog::new("web");

        PackagePlugin::new(&publisher, Path::new("/repo"), false)
            .execute_publish(
                &Workspace::new("web", "web", "main", vec![]),
                &PackagePublishConfig::default(),
                &ctx,
                &mut log,
            )
            .await;

        assert!(publisher.published.lock().unwrap().is_empty());
        assert_eq!(log.entries()[0].description, "No action taken");
        assert_eq!(log.entries()[0].outcome, Outcome::Skipped);
    }

    #[tokio::test]
    async fn test_publish_passes_version_and_folder() {
        let publisher = RecordingPublisher::default();
        let mut log = RunLog::new("web");

        PackagePlugin::new(&publisher, Path::new("/repo"), true)
            .execute_publish(
                &Workspace::new("web", "packages/web", "main", vec![]),
                &PackagePublishConfig::default(),
                &released(),
                &mut log,
            )
            .await;

        let published = publisher.published.lock().unwrap();
        assert_eq!(published[0].version, Version::new(1, 4, 0));
        assert_eq!(published[0].folder, PathBuf::from("/repo/packages/web"));
        assert!(published[0].dry_run);
        assert_eq!(log.entries()[0].description, "publish successfully a new version (1.4.0)");
        assert_eq!(log.entries()[0].comment.as_deref(), Some("DRY RUN"));
    }

    #[tokio::test]
    async fn test_publish_failure_is_logged_not_raised() {
        let publisher = RecordingPublisher {
            fail: true,
            ..RecordingPublisher::default()
        };
        let mut log = RunLog::new("web");

        PackagePlugin::new(&publisher, Path::new("."), false)
            .execute_publish(
                &Workspace::new("web", "web", "main", vec![]),
                &PackagePublishConfig::default(),
                &released(),
                &mut log,
            )
            .await;

        let entry = &log.entries()[0];
        assert_eq!(entry.outcome, Outcome::Failed);
        assert_eq!(entry.description, "publish failed for (1.4.0)");
        assert!(entry.comment.as_deref().unwrap().starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_mirror_carries_package_name() {
        let publisher = RecordingPublisher::default();
        let mut log = RunLog::new("web");
        let config = PackageMirrorConfig {
            package_name: "@acme/web-mirror".to_string(),
            pre: Some("yarn build".to_string()),
            dry_run: false,
        };

        PackagePlugin::new(&publisher, Path::new("."), false)
            .execute_mirror(
                &Workspace::new("web", "web", "main", vec![]),
                &config,
                &released(),
                &mut log,
            )
            .await;

        let mirrored = publisher.mirrored.lock().unwrap();
        assert_eq!(mirrored[0].package_name, "@acme/web-mirror");
        assert_eq!(mirrored[0].pre.as_deref(), Some("yarn build"));
        assert_eq!(log.entries()[0].plugin, "npm:mirroring");
    }

    #[test]
    fn test_request_env_vars() {
        let request = PackageRequest {
            workspace_id: "web".to_string(),
            folder: PathBuf::from("web"),
            version: Version::new(1, 0, 0),
            tag: "web-1.0.0".to_string(),
            dry_run: false,
            dist_tag: false,
        };
        let env = request.to_env_vars();
        assert_eq!(env.get("RELEASE_TOOLKIT_VERSION").map(String::as_str), Some("1.0.0"));
        assert!(!env.contains_key("RELEASE_TOOLKIT_DRY_RUN"));
    }
}
