use thiserror::Error;

/// Broad classification of a [`ReleaseError`].
///
/// Validation errors point at bad input, precondition errors at repository
/// state the operator has to fix, adapter errors at git or the hosting API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Precondition,
    Adapter,
}

/// Unified error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Invalid version format: '{0}' - expected major.minor.patch (e.g. 1.2.3)")]
    InvalidVersionFormat(String),

    #[error("Invalid increment kind: '{0}' - must be one of Major, Minor, Patch")]
    InvalidIncrementKind(String),

    #[error("Cannot apply {kind} increment to version {version}: component out of range")]
    VersionOverflow { version: String, kind: String },

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Must run from trunk branch '{trunk}' (current branch: {current})")]
    NotOnTrunk { trunk: String, current: String },

    #[error("Working directory has uncommitted changes")]
    DirtyWorkingTree,

    #[error("Branch {0} already exists")]
    BranchExists(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Pull request creation failed (HTTP {status}): {body}")]
    PullRequestRejected { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Packaging failed: {0}")]
    Packaging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a missing configuration error naming the absent key
    pub fn missing_config(msg: impl Into<String>) -> Self {
        ReleaseError::MissingConfig(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        ReleaseError::Manifest(msg.into())
    }

    /// Create a packaging error with context
    pub fn packaging(msg: impl Into<String>) -> Self {
        ReleaseError::Packaging(msg.into())
    }

    /// Classify the error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReleaseError::InvalidVersionFormat(_)
            | ReleaseError::InvalidIncrementKind(_)
            | ReleaseError::VersionOverflow { .. }
            | ReleaseError::MissingConfig(_)
            | ReleaseError::Config(_) => ErrorKind::Validation,
            ReleaseError::NotOnTrunk { .. }
            | ReleaseError::DirtyWorkingTree
            | ReleaseError::BranchExists(_) => ErrorKind::Precondition,
            ReleaseError::Git(_)
            | ReleaseError::Remote(_)
            | ReleaseError::PullRequestRejected { .. }
            | ReleaseError::Http(_)
            | ReleaseError::Manifest(_)
            | ReleaseError::Json(_)
            | ReleaseError::Packaging(_)
            | ReleaseError::Io(_) => ErrorKind::Adapter,
        }
    }
}
