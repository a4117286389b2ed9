//! Upgrade-need detection for helpsync.
//!
//! `check_needs_upgrade` compares the ref recorded in the tracked file on the
//! target branch against the branch tip, and decides whether the delta is
//! relevant (touches a watched path prefix). Missing file, script entry, or
//! trailing ref are configuration errors — a hard stop, never retried.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use helpsync_core::types::Sha;
use helpsync_core::SyncConfig;
use helpsync_github::{GithubError, Hosting};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Why a run decided not to upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Recorded and latest refs identify the same commit.
    AlreadyLatest,
    /// Refs differ but nothing under the watched prefix changed.
    NoWatchedChanges { prefix: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyLatest => write!(f, "already using the latest SHA"),
            SkipReason::NoWatchedChanges { prefix } => {
                write!(f, "no changes under {prefix} between the recorded and latest SHAs")
            }
        }
    }
}

/// Outcome of an upgrade-need check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeCheck {
    /// Ref currently recorded in the tracked file.
    pub current: Sha,
    /// Tip of the target branch, abbreviated for branch names and subjects.
    pub latest: Sha,
    /// `None` means an upgrade is needed.
    pub skip: Option<SkipReason>,
}

impl UpgradeCheck {
    pub fn needs_upgrade(&self) -> bool {
        self.skip.is_none()
    }
}

/// Errors from upgrade-need detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("hosting error: {0}")]
    Github(#[from] GithubError),

    #[error("failed to parse {file}: {source}")]
    TrackedFileSyntax {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no script named '{key}' in {file}")]
    ScriptMissing { file: String, key: String },

    #[error("script '{key}' does not end with a hex ref: '{invocation}'")]
    RefMissing { key: String, invocation: String },

    #[error("branch '{branch}' has no tip commit")]
    EmptyTip { branch: String },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check whether `target_branch` needs an upgrade pull request.
///
/// The diff query is skipped entirely when the refs are already equivalent —
/// one avoided API call per no-op run.
pub fn check_needs_upgrade<H: Hosting>(
    hosting: &H,
    config: &SyncConfig,
    target_branch: &str,
) -> Result<UpgradeCheck, DetectError> {
    let contents = hosting.file_contents(&config.tracked_file, target_branch)?;
    let current = recorded_ref(&contents, &config.tracked_file, &config.script_key)?;

    let tip = hosting.latest_sha(target_branch)?;
    if tip.as_str().is_empty() {
        return Err(DetectError::EmptyTip {
            branch: target_branch.to_string(),
        });
    }
    let latest = tip.short();

    if current.equivalent(&latest) {
        return Ok(UpgradeCheck {
            current,
            latest,
            skip: Some(SkipReason::AlreadyLatest),
        });
    }

    let affected = hosting.affected_files(&current, &latest)?;
    let relevant = affected
        .iter()
        .any(|path| path.starts_with(&config.watched_prefix));

    Ok(UpgradeCheck {
        current,
        latest,
        skip: if relevant {
            None
        } else {
            Some(SkipReason::NoWatchedChanges {
                prefix: config.watched_prefix.clone(),
            })
        },
    })
}

// ---------------------------------------------------------------------------
// Tracked-file parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TrackedFile {
    #[serde(default)]
    scripts: BTreeMap<String, String>,
}

/// Extract the vendored ref recorded in the tracked file: the trailing run of
/// hex digits in the named script's invocation string.
fn recorded_ref(contents: &str, file: &str, key: &str) -> Result<Sha, DetectError> {
    let tracked: TrackedFile =
        serde_json::from_str(contents).map_err(|e| DetectError::TrackedFileSyntax {
            file: file.to_string(),
            source: e,
        })?;

    let invocation = tracked
        .scripts
        .get(key)
        .ok_or_else(|| DetectError::ScriptMissing {
            file: file.to_string(),
            key: key.to_string(),
        })?;

    let sha = trailing_hex(invocation);
    if sha.is_empty() {
        return Err(DetectError::RefMissing {
            key: key.to_string(),
            invocation: invocation.clone(),
        });
    }
    Ok(Sha::from(sha))
}

/// The trailing run of ASCII hex digits in `s` (empty if none).
fn trailing_hex(s: &str) -> String {
    let trimmed = s.trim_end();
    let tail_len = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_hexdigit())
        .count();
    trimmed[trimmed.len() - tail_len..].to_string()
}
