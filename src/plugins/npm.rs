use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use super::package::{MirrorRequest, PackagePublisher, PackageRequest};
use crate::error::{ReleaseError, Result};

const MANIFEST_FILE: &str = "package.json";

/// [PackagePublisher] that shells out to `npm`
pub struct NpmPublisher {
    program: String,
}

impl Default for NpmPublisher {
    fn default() -> Self {
        Self::with_program("npm")
    }
}

impl NpmPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another executable in place of `npm`
    pub fn with_program(program: impl Into<String>) -> Self {
        NpmPublisher {
            program: program.into(),
        }
    }

    /// Run `npm publish` in the request folder
    ///
    /// # Returns
    /// * `Ok(())` if the command exits with code 0
    /// * `Err(ReleaseError::Downstream)` with its output otherwise
    async fn run_publish(&self, request: &PackageRequest) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("publish")
            .current_dir(&request.folder)
            .envs(request.to_env_vars());
        if request.dry_run {
            cmd.arg("--dry-run");
        }

        debug!("Running {} publish in {}", self.program, request.folder.display());
        let output = cmd.output().await.map_err(|e| {
            ReleaseError::downstream(format!("Failed to execute {} publish: {}", self.program, e))
        })?;

        if !output.status.success() {
            return Err(ReleaseError::downstream(format!(
                "{} publish failed with exit code {}\nStdout: {}\nStderr: {}",
                self.program,
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    async fn run_pre(&self, command: &str, request: &PackageRequest) -> Result<()> {
        debug!("Running pre command '{}' in {}", command, request.folder.display());
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&request.folder)
            .envs(request.to_env_vars())
            .output()
            .await
            .map_err(|e| {
                ReleaseError::downstream(format!("Failed to execute '{}': {}", command, e))
            })?;

        if !output.status.success() {
            return Err(ReleaseError::downstream(format!(
                "'{}' failed with exit code {}\nStdout: {}\nStderr: {}",
                command,
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PackagePublisher for NpmPublisher {
    async fn publish(&self, request: &PackageRequest) -> Result<()> {
        if request.dist_tag {
            return Err(ReleaseError::downstream(
                "publishing under a dist-tag is currently not supported",
            ));
        }

        let manifest = request.folder.join(MANIFEST_FILE);
        set_manifest_field(&manifest, "version", &request.version.to_string())?;
        self.run_publish(request).await
    }

    async fn mirror(&self, request: &MirrorRequest) -> Result<()> {
        if let Some(pre) = &request.pre {
            self.run_pre(pre, &request.package).await?;
        }

        let manifest = request.package.folder.join(MANIFEST_FILE);
        set_manifest_field(&manifest, "name", &request.package_name)?;
        self.publish(&request.package).await
    }
}

/// Set one top-level string field of a JSON manifest, keeping key order
pub fn set_manifest_field(path: &Path, field: &str, value: &str) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ReleaseError::downstream(format!("Cannot read {}: {}", path.display(), e))
    })?;

    let mut manifest: Value = serde_json::from_str(&content).map_err(|e| {
        ReleaseError::downstream(format!("Cannot parse {}: {}", path.display(), e))
    })?;
    let object = manifest.as_object_mut().ok_or_else(|| {
        ReleaseError::downstream(format!("{} is not a JSON object", path.display()))
    })?;
    object.insert(field.to_string(), Value::String(value.to_string()));

    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    manifest.serialize(&mut serializer)?;

    std::fs::write(path, buffer).map_err(|e| {
        ReleaseError::downstream(format!("Cannot write {}: {}", path.display(), e))
    })
}
