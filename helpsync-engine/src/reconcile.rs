//! The reconciliation pass.
//!
//! Sequential, no backtracking:
//! 1. fresh working copy, committer identity, `origin` + `upstream` remotes
//! 2. candidate automation branches on origin
//! 3. open-PR map (fan-out, joined in input order); obsolete branches deleted
//! 4. short-circuit when the target ref already has an open PR
//! 5. fetch / branch / substitute / commit / unshallow / force-push
//! 6. submit PR, attach labels
//! 7. comment on superseded PRs (never auto-closed — a newer ref can prove
//!    broken, and a human may need to fall back)
//!
//! Steps 3-deletion, 6-labels and 7 are ignore-and-log; everything else is
//! fatal and propagates.

use std::path::Path;
use std::thread;

use helpsync_core::types::{PullRequest, Sha};
use helpsync_core::SyncConfig;
use helpsync_git::{GitOptions, Refspec, WorkingCopy};
use helpsync_github::{Hosting, PullRequestQuery};

use crate::best_effort;
use crate::branch::{automation_branch_name, is_automation_branch};
use crate::error::{io_err, EngineError};
use crate::message::{commit_message, commit_subject};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One upgrade the detector decided is needed.
#[derive(Debug, Clone, Copy)]
pub struct UpgradeTarget<'a> {
    /// Branch being checked and targeted by the pull request.
    pub branch: &'a str,
    /// Ref currently recorded in the tracked file.
    pub current: &'a Sha,
    /// Abbreviated tip the tracked file should record instead.
    pub latest: &'a Sha,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// An open PR for exactly this target ref already exists; nothing was
    /// created.
    ExistingPullRequest {
        branch: String,
        pull_requests: Vec<PullRequest>,
    },

    /// A new branch was pushed and a PR submitted.
    Submitted {
        pull_request: PullRequest,
        /// Numbers of previously-open PRs this submission supersedes.
        superseded: Vec<u64>,
        /// Obsolete automation branches removed from origin.
        deleted_branches: Vec<String>,
    },

    /// `--dry-run`: what a real pass would have done.
    DryRun {
        branch: String,
        would_supersede: Vec<u64>,
        would_delete: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Converge remote state to exactly one open PR for `target.latest`.
///
/// The working copy must be freshly created; the caller owns its lifetime and
/// destroys it (best-effort) after this returns.
pub fn reconcile<G, H>(
    git: &mut G,
    hosting: &H,
    config: &SyncConfig,
    target: &UpgradeTarget<'_>,
    dry_run: bool,
) -> Result<ReconcileOutcome, EngineError>
where
    G: WorkingCopy,
    H: Hosting + Sync,
{
    // Step 1: fresh working copy with both remotes registered.
    git.init(&GitOptions::new())?;
    git.config("user.name", &config.committer_name)?;
    git.config("user.email", &config.committer_email)?;
    git.add_remote("origin", &config.origin.clone_url())?;
    git.add_remote("upstream", &config.upstream.clone_url())?;

    // Step 2: candidate automation branches, in listing order.
    let candidates: Vec<String> = git
        .remote_branches("origin")?
        .into_iter()
        .filter(|name| is_automation_branch(&config.branch_prefix, name))
        .collect();

    // Step 3: branch → open-PR map, then delete branches with no open PR.
    // Deletion happens before duplicate detection and before any new work so
    // stale branches never accumulate.
    let open_by_branch = open_pull_requests_by_branch(hosting, config, &candidates)?;

    let mut deleted = Vec::new();
    let mut live: Vec<(String, Vec<PullRequest>)> = Vec::new();
    for (branch, open) in open_by_branch {
        if open.is_empty() {
            if dry_run {
                tracing::info!("[dry-run] would delete obsolete branch {branch}");
                deleted.push(branch);
            } else if delete_remote_branch(git, &branch).is_some() {
                deleted.push(branch);
            }
        } else {
            live.push((branch, open));
        }
    }

    // Step 4: at most one open PR per ref — stop if ours already exists.
    let new_branch = automation_branch_name(&config.branch_prefix, target.branch, target.latest);
    if let Some((_, existing)) = live.iter().find(|(branch, _)| *branch == new_branch) {
        tracing::info!(
            "open pull request for {} already exists: {}",
            target.latest,
            existing
                .iter()
                .map(|pr| format!("#{}", pr.number))
                .collect::<Vec<_>>()
                .join(", ")
        );
        return Ok(ReconcileOutcome::ExistingPullRequest {
            branch: new_branch,
            pull_requests: existing.clone(),
        });
    }

    // Every remaining live branch stages an older ref; its open PRs are
    // superseded by the one about to be created.
    let superseded: Vec<u64> = live
        .iter()
        .flat_map(|(_, prs)| prs.iter().map(|pr| pr.number))
        .collect();

    if dry_run {
        tracing::info!("[dry-run] would push {new_branch} and open a pull request");
        return Ok(ReconcileOutcome::DryRun {
            branch: new_branch,
            would_supersede: dedup(superseded),
            would_delete: deleted,
        });
    }

    // Step 5: materialize the upgrade on a new branch and publish it.
    git.fetch(
        "upstream",
        Some(target.branch),
        &GitOptions::new().value("depth", "1").switch("no-tags"),
    )?;
    git.checkout(
        &format!("upstream/{}", target.branch),
        &GitOptions::new().value("b", &new_branch),
    )?;
    apply_upgrade(git.dir(), &config.tracked_file, target.current, target.latest)?;

    let subject = commit_subject(&config.commit_prefix, target.latest);
    git.commit(
        &commit_message(&subject, &superseded),
        &GitOptions::new().switch("all"),
    )?;
    git.fetch("origin", None, &GitOptions::new().switch("unshallow"))?;
    git.push(
        "origin",
        &Refspec::branch(&new_branch),
        &GitOptions::new().switch("force"),
    )?;

    // Step 6: submit the pull request; labels are cosmetic, never fatal.
    let head = format!("{}:{new_branch}", config.origin.owner);
    let pull_request = hosting.create_pull_request(&head, target.branch, &subject)?;
    tracing::info!("created pull request #{}: {}", pull_request.number, pull_request.html_url);
    if !config.labels.is_empty() {
        best_effort(
            "attaching labels",
            hosting.add_labels(pull_request.number, &config.labels),
        );
    }

    // Step 7: point superseded PRs at the replacement. They stay open.
    let superseded = dedup(superseded);
    for number in &superseded {
        best_effort(
            &format!("commenting on superseded #{number}"),
            hosting.comment(*number, &format!("Superseded by #{}.", pull_request.number)),
        );
    }

    Ok(ReconcileOutcome::Submitted {
        pull_request,
        superseded,
        deleted_branches: deleted,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// One open-PR query per branch, fanned out and joined in input order. A
/// failed query is fatal after the join — the map gates dedup correctness.
fn open_pull_requests_by_branch<H: Hosting + Sync>(
    hosting: &H,
    config: &SyncConfig,
    branches: &[String],
) -> Result<Vec<(String, Vec<PullRequest>)>, EngineError> {
    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = branches
            .iter()
            .map(|branch| {
                scope.spawn(move || {
                    let query = PullRequestQuery::with_head(&config.origin.owner, branch);
                    hosting.pull_requests(&query)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("pull-request query thread panicked"))
            .collect()
    });

    branches
        .iter()
        .zip(results)
        .map(|(branch, result)| {
            let open: Vec<PullRequest> = result?
                .into_iter()
                .filter(|pr| pr.title.starts_with(&config.commit_prefix) && pr.is_open())
                .collect();
            Ok((branch.clone(), open))
        })
        .collect()
}

/// Best-effort removal of one origin-side ref. Returns `Some(())` on success.
fn delete_remote_branch<G: WorkingCopy>(git: &mut G, branch: &str) -> Option<()> {
    tracing::info!("deleting obsolete automation branch {branch}");
    best_effort(
        &format!("deleting origin branch {branch}"),
        git.push(
            "origin",
            &Refspec::branch(branch),
            &GitOptions::new().switch("delete"),
        ),
    )
}

/// Substitute the recorded ref with the new one in the checked-out tracked
/// file.
fn apply_upgrade(
    workdir: &Path,
    tracked_file: &str,
    current: &Sha,
    latest: &Sha,
) -> Result<(), EngineError> {
    let path = workdir.join(tracked_file);
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if !contents.contains(current.as_str()) {
        return Err(EngineError::StaleTrackedFile {
            file: tracked_file.to_string(),
            current: current.to_string(),
        });
    }
    let updated = contents.replace(current.as_str(), latest.as_str());
    std::fs::write(&path, updated).map_err(|e| io_err(&path, e))?;
    Ok(())
}

fn dedup(numbers: Vec<u64>) -> Vec<u64> {
    let mut seen = Vec::new();
    for number in numbers {
        if !seen.contains(&number) {
            seen.push(number);
        }
    }
    seen
}
