//! Subcommand implementations and shared runtime lookups.

pub mod check;
pub mod init;
pub mod upgrade;

use std::path::Path;

use anyhow::{Context, Result};

use helpsync_core::{config, SyncConfig};

/// Load configuration from an explicit `--config` path or the default
/// location.
pub(crate) fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    match path {
        Some(path) => config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => config::load().context("failed to load configuration"),
    }
}

/// API/push token from `GITHUB_TOKEN`, if set and non-empty.
pub(crate) fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|token| !token.is_empty())
}

/// Whether this run is in a continuous-integration context (`CI` set and
/// non-empty).
pub(crate) fn ci_context() -> bool {
    std::env::var("CI")
        .map(|value| !value.is_empty())
        .unwrap_or(false)
}
