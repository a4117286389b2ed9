//! # helpsync-git
//!
//! Version-control adapter: a typed option bag rendered to `git` command-line
//! flags, and a [`WorkingCopy`] implementation that drives one ephemeral
//! checkout directory via the `git` binary.

pub mod error;
pub mod options;
pub mod workdir;

pub use error::GitError;
pub use options::GitOptions;
pub use workdir::{GitWorkdir, Refspec, WorkingCopy};
