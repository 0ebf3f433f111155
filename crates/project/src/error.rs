//! Error types for project replica operations (thiserror-based).

use thiserror::Error;

/// Errors raised while loading or patching the project replica.
///
/// Diff-application errors are recovered per-action: the action is
/// skipped with a debug log and the host remains the source of truth.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown entity id in diff key: {0}")]
    UnknownEntity(String),

    #[error("bad diff key: {0}")]
    BadKey(String),

    #[error("missing diff target: {0}")]
    MissingTarget(String),
}

/// Convenience Result type for project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;
