use crate::domain::Version;

/// Outcome of the source-control plugin for one workspace run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceControlStatus {
    Success,
    Failed,
    /// Nothing to release
    NoChanges,
}

/// State shared by the plugins of one workspace run
///
/// Written by the source-control plugin, read by every plugin after it. A fresh
/// context is created per workspace run and dropped at its end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunContext {
    status: Option<SourceControlStatus>,
    tag: Option<String>,
    version: Option<Version>,
    release_url: Option<String>,
    error: Option<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_release(
        &mut self,
        tag: impl Into<String>,
        version: Version,
        url: impl Into<String>,
    ) {
        self.status = Some(SourceControlStatus::Success);
        self.tag = Some(tag.into());
        self.version = Some(version);
        self.release_url = Some(url.into());
        self.error = None;
    }

    pub fn record_no_changes(&mut self) {
        self.status = Some(SourceControlStatus::NoChanges);
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.status = Some(SourceControlStatus::Failed);
        self.error = Some(error.into());
    }

    /// `None` until a source-control plugin has run
    pub fn status(&self) -> Option<SourceControlStatus> {
        self.status
    }

    /// The version downstream plugins should publish, if the release succeeded
    pub fn released_version(&self) -> Option<Version> {
        match self.status {
            Some(SourceControlStatus::Success) => self.version,
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn release_url(&self) -> Option<&str> {
        self.release_url.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
