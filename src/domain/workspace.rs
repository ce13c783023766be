use crate::config::{PluginConfig, WorkspaceConfig};
use crate::domain::Commit;

/// Path values that mean "the whole repository"
const WHOLE_REPOSITORY: [&str; 4] = ["", ".", "./", "/"];

/// One independently-versioned sub-project tracked within the repository
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub id: String,
    /// Normalized path relative to the repository root; empty for the whole repository
    pub path: String,
    pub branch: String,
    pub plugins: Vec<PluginConfig>,
}

impl Workspace {
    pub fn new(
        id: impl Into<String>,
        path: &str,
        branch: impl Into<String>,
        plugins: Vec<PluginConfig>,
    ) -> Self {
        Workspace {
            id: id.into(),
            path: normalize_path(path),
            branch: branch.into(),
            plugins,
        }
    }

    pub fn is_whole_repository(&self) -> bool {
        self.path.is_empty()
    }

    /// Whether a changed file lies inside this workspace.
    ///
    /// Matching is on path-component boundaries, so `packages/web` does not claim
    /// `packages/webapp/index.js`.
    pub fn contains_path(&self, file: &str) -> bool {
        if self.is_whole_repository() {
            return true;
        }

        let file = normalize_path(file);
        file == self.path
            || (file.starts_with(&self.path) && file[self.path.len()..].starts_with('/'))
    }

    /// Whether a commit changed at least one file inside this workspace
    pub fn is_touched_by(&self, commit: &Commit) -> bool {
        self.is_whole_repository() || commit.files.iter().any(|f| self.contains_path(f))
    }

    /// Path filter for remote commit listings; `None` for the whole repository
    pub fn path_filter(&self) -> Option<&str> {
        if self.is_whole_repository() {
            None
        } else {
            Some(&self.path)
        }
    }
}

impl From<&WorkspaceConfig> for Workspace {
    fn from(config: &WorkspaceConfig) -> Self {
        Workspace::new(
            config.identity(),
            &config.folder_path,
            config.branch.clone(),
            config.plugins.clone(),
        )
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if WHOLE_REPOSITORY.contains(&trimmed) {
        return String::new();
    }

    let mut rest = trimmed;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }

    rest.trim_end_matches('/').to_string()
}
