//! One ephemeral checkout directory driven via the `git` binary.
//!
//! [`GitWorkdir`] owns a single directory for the lifetime of one run: it is
//! recreated fresh on `create`, every operation runs `git -C <dir> …`, and
//! `destroy` removes the directory and poisons the handle — any later call
//! fails with [`GitError::Closed`].

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{io_err, GitError};
use crate::options::GitOptions;

// ---------------------------------------------------------------------------
// Refspec
// ---------------------------------------------------------------------------

/// Source/destination pair for a push.
///
/// Defaulting rules, stated once:
/// - both omitted → push the current branch under its own name
/// - local only → push `local` under its own name
/// - both → `local:remote`
/// - remote only → `HEAD:remote`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refspec {
    pub local: Option<String>,
    pub remote: Option<String>,
}

impl Refspec {
    /// Push the current branch under its own name.
    pub fn current() -> Self {
        Self::default()
    }

    /// Push `branch` under its own name.
    pub fn branch(branch: &str) -> Self {
        Self {
            local: Some(branch.to_string()),
            remote: None,
        }
    }

    fn render(&self, current_branch: impl FnOnce() -> Result<String, GitError>) -> Result<String, GitError> {
        match (&self.local, &self.remote) {
            (None, None) => current_branch(),
            (Some(local), None) => Ok(local.clone()),
            (Some(local), Some(remote)) => Ok(format!("{local}:{remote}")),
            (None, Some(remote)) => Ok(format!("HEAD:{remote}")),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkingCopy
// ---------------------------------------------------------------------------

/// Version-control operations against one working copy.
///
/// The reconciliation engine is written against this trait; tests substitute
/// a recording fake for [`GitWorkdir`].
pub trait WorkingCopy {
    fn init(&mut self, options: &GitOptions) -> Result<(), GitError>;
    fn add_remote(&mut self, name: &str, url: &str) -> Result<(), GitError>;
    fn config(&mut self, key: &str, value: &str) -> Result<(), GitError>;
    fn fetch(&mut self, remote: &str, branch: Option<&str>, options: &GitOptions)
        -> Result<(), GitError>;
    fn checkout(&mut self, target: &str, options: &GitOptions) -> Result<(), GitError>;
    fn commit(&mut self, message: &str, options: &GitOptions) -> Result<(), GitError>;
    fn push(&mut self, remote: &str, refspec: &Refspec, options: &GitOptions)
        -> Result<(), GitError>;

    /// Branch names on `remote`, freshened by a shallow tag-less fetch first.
    fn remote_branches(&mut self, remote: &str) -> Result<Vec<String>, GitError>;

    fn current_branch(&mut self) -> Result<String, GitError>;

    /// The checkout directory, for content mutation between fetch and commit.
    fn dir(&self) -> &Path;

    /// Remove the checkout directory. Every later call fails with
    /// [`GitError::Closed`].
    fn destroy(&mut self) -> Result<(), GitError>;
}

// ---------------------------------------------------------------------------
// GitWorkdir
// ---------------------------------------------------------------------------

/// [`WorkingCopy`] backed by the `git` binary.
#[derive(Debug)]
pub struct GitWorkdir {
    dir: PathBuf,
    destroyed: bool,
}

impl GitWorkdir {
    /// Bind a working copy to `dir`, destroying any pre-existing directory at
    /// that path first so every run starts from a clean slate.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, GitError> {
        let dir = dir.into();
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        Ok(Self {
            dir,
            destroyed: false,
        })
    }

    fn ensure_open(&self) -> Result<(), GitError> {
        if self.destroyed {
            return Err(GitError::Closed {
                path: self.dir.clone(),
            });
        }
        Ok(())
    }

    /// Run `git -C <dir> <args>`, returning trimmed stdout.
    fn run(&self, args: &[String]) -> Result<String, GitError> {
        self.ensure_open()?;
        let joined = args.join(" ");
        tracing::debug!("git {joined}");

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.dir)
            .args(args)
            .output()
            .map_err(|e| GitError::Spawn {
                args: joined.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GitError::Command {
                args: joined,
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run_parts<'a>(
        &self,
        subcommand: &str,
        options: &GitOptions,
        trailing: impl IntoIterator<Item = &'a str>,
    ) -> Result<String, GitError> {
        let mut args = vec![subcommand.to_string()];
        args.extend(options.to_args());
        args.extend(trailing.into_iter().map(str::to_string));
        self.run(&args)
    }
}

impl WorkingCopy for GitWorkdir {
    fn init(&mut self, options: &GitOptions) -> Result<(), GitError> {
        self.run_parts("init", options, [])?;
        Ok(())
    }

    fn add_remote(&mut self, name: &str, url: &str) -> Result<(), GitError> {
        self.run(&[
            "remote".to_string(),
            "add".to_string(),
            name.to_string(),
            url.to_string(),
        ])?;
        Ok(())
    }

    fn config(&mut self, key: &str, value: &str) -> Result<(), GitError> {
        self.run(&["config".to_string(), key.to_string(), value.to_string()])?;
        Ok(())
    }

    fn fetch(
        &mut self,
        remote: &str,
        branch: Option<&str>,
        options: &GitOptions,
    ) -> Result<(), GitError> {
        let mut trailing = vec![remote];
        if let Some(branch) = branch {
            trailing.push(branch);
        }
        self.run_parts("fetch", options, trailing)?;
        Ok(())
    }

    fn checkout(&mut self, target: &str, options: &GitOptions) -> Result<(), GitError> {
        self.run_parts("checkout", options, [target])?;
        Ok(())
    }

    fn commit(&mut self, message: &str, options: &GitOptions) -> Result<(), GitError> {
        let mut args = vec!["commit".to_string(), "-m".to_string(), message.to_string()];
        args.extend(options.to_args());
        self.run(&args)?;
        Ok(())
    }

    fn push(
        &mut self,
        remote: &str,
        refspec: &Refspec,
        options: &GitOptions,
    ) -> Result<(), GitError> {
        let rendered = refspec.render(|| {
            self.run(&[
                "rev-parse".to_string(),
                "--abbrev-ref".to_string(),
                "HEAD".to_string(),
            ])
        })?;
        self.run_parts("push", options, [remote, rendered.as_str()])?;
        Ok(())
    }

    fn remote_branches(&mut self, remote: &str) -> Result<Vec<String>, GitError> {
        // Freshness guarantee: shallow, tag-less fetch before enumerating.
        self.fetch(
            remote,
            None,
            &GitOptions::new().value("depth", "1").switch("no-tags"),
        )?;

        let listed = self.run(&[
            "for-each-ref".to_string(),
            "--format=%(refname:short)".to_string(),
            format!("refs/remotes/{remote}"),
        ])?;

        let prefix = format!("{remote}/");
        Ok(listed
            .lines()
            .filter_map(|line| line.strip_prefix(&prefix))
            .filter(|name| *name != "HEAD")
            .map(str::to_string)
            .collect())
    }

    fn current_branch(&mut self) -> Result<String, GitError> {
        self.run(&[
            "rev-parse".to_string(),
            "--abbrev-ref".to_string(),
            "HEAD".to_string(),
        ])
    }

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn destroy(&mut self) -> Result<(), GitError> {
        self.ensure_open()?;
        std::fs::remove_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        self.destroyed = true;
        Ok(())
    }
}
