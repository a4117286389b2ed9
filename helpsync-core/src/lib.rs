//! Helpsync core library — domain types, configuration, errors.
//!
//! Public API surface:
//! - [`types`] — [`Sha`], [`RepoId`], [`PullRequest`]
//! - [`config`] — [`SyncConfig`] load / save / default path
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::SyncConfig;
pub use error::ConfigError;
pub use types::{PrState, PullRequest, RepoId, Sha, SHORT_SHA_LEN};
