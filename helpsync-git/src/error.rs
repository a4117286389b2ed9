//! Error types for helpsync-git.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from working-copy operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary could not be spawned at all.
    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    /// A git command exited nonzero; stderr is kept for diagnostics.
    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },

    /// Filesystem failure while managing the checkout directory.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation attempted after `destroy()` — a programming-contract
    /// violation, always fatal.
    #[error("working copy at {path} has been destroyed")]
    Closed { path: PathBuf },
}

/// Convenience constructor for [`GitError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GitError {
    GitError::Io {
        path: path.into(),
        source,
    }
}
