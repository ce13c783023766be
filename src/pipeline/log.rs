use tracing::{info, warn};

/// How a plugin invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Nothing to do, no side effects
    Skipped,
    Failed,
}

/// One row of a workspace summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub plugin: String,
    pub description: String,
    pub comment: Option<String>,
    pub outcome: Outcome,
}

/// Outcomes of one workspace run, in plugin order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLog {
    workspace_id: String,
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        RunLog {
            workspace_id: workspace_id.into(),
            entries: Vec::new(),
        }
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn success(
        &mut self,
        plugin: &str,
        description: impl Into<String>,
        comment: Option<String>,
    ) {
        self.record(plugin, description.into(), comment, Outcome::Success);
    }

    pub fn skipped(
        &mut self,
        plugin: &str,
        description: impl Into<String>,
        comment: Option<String>,
    ) {
        self.record(plugin, description.into(), comment, Outcome::Skipped);
    }

    pub fn failure(
        &mut self,
        plugin: &str,
        description: impl Into<String>,
        comment: Option<String>,
    ) {
        self.record(plugin, description.into(), comment, Outcome::Failed);
    }

    fn record(
        &mut self,
        plugin: &str,
        description: String,
        comment: Option<String>,
        outcome: Outcome,
    ) {
        let comment = comment.filter(|c| !c.is_empty());
        let detail = comment.as_deref().unwrap_or("");
        match outcome {
            Outcome::Failed => {
                warn!(workspace = %self.workspace_id, plugin, "{} {}", description, detail)
            }
            _ => info!(workspace = %self.workspace_id, plugin, "{} {}", description, detail),
        }

        self.entries.push(LogEntry {
            plugin: plugin.to_string(),
            description,
            comment,
            outcome,
        });
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|e| e.outcome == Outcome::Failed)
    }
}
