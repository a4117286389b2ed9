//! Error types for helpsync-engine.

use std::path::PathBuf;

use thiserror::Error;

use helpsync_git::GitError;
use helpsync_github::GithubError;

/// All errors that can arise from reconciliation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A working-copy operation failed.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// A hosting-API call failed on a step that gates correctness.
    #[error("hosting error: {0}")]
    Github(#[from] GithubError),

    /// An I/O error while mutating the tracked file, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The checked-out tracked file no longer contains the recorded ref the
    /// detector extracted — the branch tip moved between check and upgrade.
    #[error("tracked file {file} does not contain the recorded ref {current}")]
    StaleTrackedFile { file: String, current: String },
}

/// Convenience constructor for [`EngineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}
