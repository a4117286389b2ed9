//! YAML sync configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.helpsync/
//!   config.yml   (mode 0600 — may sit next to a token-bearing environment)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::RepoId;

/// Configuration for one upstream→downstream sync relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Canonical repository pull requests are opened against.
    pub upstream: RepoId,

    /// Fork that hosts automation branches.
    pub origin: RepoId,

    /// Branch checked and targeted when none is given on the command line.
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Repository-relative path of the file that records the vendored ref.
    pub tracked_file: String,

    /// Key under `scripts` in the tracked file whose invocation string ends
    /// with the vendored ref.
    pub script_key: String,

    /// Upstream changes are relevant only when they touch paths under this
    /// prefix.
    pub watched_prefix: String,

    /// Commit subjects (and thus PR titles) start with this; it is also how
    /// previously-opened automation PRs are recognized.
    pub commit_prefix: String,

    /// Automation branches are named `<branch_prefix>--<branch>--<ref>`.
    pub branch_prefix: String,

    /// Labels attached to newly created pull requests.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Repository that receives a diagnostic issue when a CI run fails.
    #[serde(default)]
    pub tracker: Option<RepoId>,

    /// Committer identity for upgrade commits.
    #[serde(default = "default_committer_name")]
    pub committer_name: String,
    #[serde(default = "default_committer_email")]
    pub committer_email: String,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_committer_name() -> String {
    "helpsync".to_string()
}

fn default_committer_email() -> String {
    "helpsync@users.noreply.github.com".to_string()
}

impl SyncConfig {
    /// A starter configuration written by `helpsync init`, meant to be
    /// edited before first use.
    pub fn starter() -> Self {
        Self {
            upstream: RepoId {
                owner: "your-org".to_string(),
                name: "docs-site".to_string(),
            },
            origin: RepoId {
                owner: "your-bot".to_string(),
                name: "docs-site".to_string(),
            },
            default_branch: default_branch(),
            tracked_file: "package.json".to_string(),
            script_key: "generate-help-docs".to_string(),
            watched_prefix: "help/".to_string(),
            commit_prefix: "Upgrade help pages to ".to_string(),
            branch_prefix: "automated-help-upgrade".to_string(),
            labels: vec!["docs".to_string(), "automated".to_string()],
            tracker: None,
            committer_name: default_committer_name(),
            committer_email: default_committer_email(),
        }
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.helpsync/config.yml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".helpsync").join("config.yml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the configuration from an explicit file path.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path + line context) if malformed YAML.
pub fn load_from(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load the configuration from `<home>/.helpsync/config.yml`.
pub fn load_at(home: &Path) -> Result<SyncConfig, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SyncConfig, ConfigError> {
    load_at(&home()?)
}

/// Save the configuration to `<home>/.helpsync/config.yml` (mode 0600).
pub fn save_at(home: &Path, config: &SyncConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path_at(home);
    let Some(dir) = path.parent() else {
        return Err(ConfigError::Io(std::io::Error::other(
            "invalid config path",
        )));
    };
    std::fs::create_dir_all(dir)?;
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&path, yaml)?;
    set_file_permissions(&path)?;
    Ok(path)
}

/// `save_at` convenience wrapper.
pub fn save(config: &SyncConfig) -> Result<PathBuf, ConfigError> {
    save_at(&home()?, config)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
