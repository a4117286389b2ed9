//! Domain types for helpsync.
//!
//! Upstream references are opaque strings; two references are treated as the
//! same commit when either is a string prefix of the other, so abbreviated
//! and full-length forms compare as equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical abbreviated length for refs used in branch names and commit
/// subjects.
pub const SHORT_SHA_LEN: usize = 9;

// ---------------------------------------------------------------------------
// Sha
// ---------------------------------------------------------------------------

/// An opaque upstream version reference, possibly abbreviated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha(pub String);

impl Sha {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Truncate to [`SHORT_SHA_LEN`] characters for branch names and commit
    /// subjects. Refs already at or below that length are returned as-is.
    pub fn short(&self) -> Sha {
        let end = self.0.len().min(SHORT_SHA_LEN);
        Sha(self.0[..end].to_string())
    }

    /// Whether two refs identify the same commit: true when either string is
    /// a prefix of the other. Symmetric; handles unequal lengths. A short
    /// ref that happens to prefix an unrelated long one is accepted risk.
    pub fn equivalent(&self, other: &Sha) -> bool {
        self.0.starts_with(&other.0) || other.0.starts_with(&self.0)
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Sha {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Sha {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// RepoId
// ---------------------------------------------------------------------------

/// A hosting-side repository identifier (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

/// A repository identifier that is not of the form `owner/name`.
#[derive(Debug, Error)]
#[error("invalid repository id '{0}'; expected owner/name")]
pub struct InvalidRepoId(pub String);

impl RepoId {
    /// HTTPS clone URL for this repository.
    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = InvalidRepoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(InvalidRepoId(s.to_string())),
        }
    }
}

impl TryFrom<String> for RepoId {
    type Error = InvalidRepoId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

/// Tracked state of a pull request as reported by the hosting system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
}

/// A pull request record as reported by the hosting system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    pub title: String,
    pub state: PrState,
    /// Name of the branch the pull request is from.
    pub head_ref: String,
}

impl PullRequest {
    pub fn is_open(&self) -> bool {
        self.state == PrState::Open
    }
}
