use thiserror::Error;

/// Unified error type for release-toolkit operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No workspaces configured")]
    NoWorkspaces,

    #[error("Boundary lookup failed: {0}")]
    BoundaryLookup(String),

    #[error("Commit walk failed: {0}")]
    Walk(String),

    #[error("Publish failed: {0}")]
    PublishWrite(String),

    #[error("Package plugin failed: {0}")]
    Downstream(String),

    /// Transport failure after the client's own retry policy gave up
    #[error("Remote request failed: {message}")]
    Request { status: Option<u16>, message: String },

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results in release-toolkit
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a boundary lookup error with context
    pub fn boundary_lookup(msg: impl Into<String>) -> Self {
        ReleaseError::BoundaryLookup(msg.into())
    }

    /// Create a commit walk error with context
    pub fn walk(msg: impl Into<String>) -> Self {
        ReleaseError::Walk(msg.into())
    }

    /// Create a publish error with context
    pub fn publish(msg: impl Into<String>) -> Self {
        ReleaseError::PublishWrite(msg.into())
    }

    /// Create a downstream plugin error with context
    pub fn downstream(msg: impl Into<String>) -> Self {
        ReleaseError::Downstream(msg.into())
    }

    /// Create a transport error, optionally carrying the HTTP status
    pub fn request(status: Option<u16>, msg: impl Into<String>) -> Self {
        ReleaseError::Request {
            status,
            message: msg.into(),
        }
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a template error with context
    pub fn template(msg: impl Into<String>) -> Self {
        ReleaseError::Template(msg.into())
    }

    /// Whether a transport error is worth another attempt.
    ///
    /// Network failures (no status), rate limiting and server errors are retryable;
    /// everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReleaseError::Request { status: None, .. } => true,
            ReleaseError::Request {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}
