//! `helpsync upgrade` — check, then converge to exactly one open upgrade PR.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use helpsync_core::SyncConfig;
use helpsync_detector::{check_needs_upgrade, UpgradeCheck};
use helpsync_engine::{best_effort, reconcile, ReconcileOutcome, UpgradeTarget};
use helpsync_git::{GitWorkdir, WorkingCopy};
use helpsync_github::{GithubClient, Hosting};

use crate::credentials;

/// Arguments for `helpsync upgrade`.
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Branch to check and target (defaults to the configured default branch).
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Show what would happen without deleting, pushing, or opening anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Path to the configuration file (defaults to ~/.helpsync/config.yml).
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl UpgradeArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config(self.config.as_deref())?;
        let token = super::github_token();
        let ci = super::ci_context();
        let branch = self
            .branch
            .clone()
            .unwrap_or_else(|| config.default_branch.clone());
        let hosting = GithubClient::new(config.upstream.clone(), token.clone());

        let check = check_needs_upgrade(&hosting, &config, &branch)
            .with_context(|| format!("upgrade check failed for '{branch}'"))?;
        if let Some(reason) = &check.skip {
            println!("{} '{branch}' — {reason}", "✓ no upgrade needed".green());
            return Ok(());
        }
        println!(
            "↑ upgrading '{branch}': {} → {}",
            check.current, check.latest
        );

        // Credential provisioning only applies to real CI runs.
        let credential_token = if ci && !self.dry_run {
            token.as_deref()
        } else {
            None
        };

        match run_reconciliation(&config, &hosting, &branch, &check, self.dry_run, credential_token)
        {
            Ok(outcome) => {
                print_outcome(&outcome);
                Ok(())
            }
            Err(err) => {
                best_effort(
                    "removing credential file",
                    credentials::remove(&credentials::default_path()),
                );
                if ci {
                    report_failure(&config, token, &branch, &err);
                }
                Err(err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

fn run_reconciliation(
    config: &SyncConfig,
    hosting: &GithubClient,
    branch: &str,
    check: &UpgradeCheck,
    dry_run: bool,
    credential_token: Option<&str>,
) -> Result<ReconcileOutcome> {
    let checkout = std::env::temp_dir().join("helpsync-checkout");
    let mut git = GitWorkdir::create(&checkout)
        .with_context(|| format!("failed to prepare working copy at {}", checkout.display()))?;

    let result = drive(&mut git, config, hosting, branch, check, dry_run, credential_token);

    // Cleanup is best-effort on every path and never masks the primary
    // result. Credential removal tolerates a file that was never written.
    best_effort(
        "removing credential file",
        credentials::remove(&credentials::default_path()),
    );
    best_effort("destroying working copy", git.destroy());

    result
}

fn drive(
    git: &mut GitWorkdir,
    config: &SyncConfig,
    hosting: &GithubClient,
    branch: &str,
    check: &UpgradeCheck,
    dry_run: bool,
    credential_token: Option<&str>,
) -> Result<ReconcileOutcome> {
    if let Some(token) = credential_token {
        credentials::provision(git, token)?;
    }

    let target = UpgradeTarget {
        branch,
        current: &check.current,
        latest: &check.latest,
    };
    Ok(reconcile(git, hosting, config, &target, dry_run)?)
}

fn print_outcome(outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::ExistingPullRequest {
            branch,
            pull_requests,
        } => {
            println!(
                "{} for '{branch}'",
                "✓ open pull request already exists".green()
            );
            for pr in pull_requests {
                println!("  #{} {}", pr.number, pr.html_url);
            }
        }
        ReconcileOutcome::Submitted {
            pull_request,
            superseded,
            deleted_branches,
        } => {
            println!(
                "{} #{} {}",
                "✓ opened pull request".green(),
                pull_request.number,
                pull_request.html_url
            );
            for branch in deleted_branches {
                println!("  ✂ deleted stale branch {branch}");
            }
            for number in superseded {
                println!("  ↷ superseded #{number} (commented, left open)");
            }
        }
        ReconcileOutcome::DryRun {
            branch,
            would_supersede,
            would_delete,
        } => {
            println!("[dry-run] would push '{branch}' and open a pull request");
            for branch in would_delete {
                println!("  ~ would delete stale branch {branch}");
            }
            for number in would_supersede {
                println!("  ~ would supersede #{number}");
            }
        }
    }
}

/// File a diagnostic issue against the tracker repository. Failures here are
/// reported to stderr only — the run's outcome is already decided.
fn report_failure(config: &SyncConfig, token: Option<String>, branch: &str, err: &anyhow::Error) {
    let Some(tracker) = &config.tracker else {
        eprintln!("no tracker repository configured; skipping failure issue");
        return;
    };

    let client = GithubClient::new(tracker.clone(), token);
    let title = format!("helpsync: upgrade run failed for '{branch}'");
    let body = format!(
        "Automated upgrade run failed at {}.\n\n```\n{err:#}\n```\n",
        Utc::now().to_rfc3339()
    );
    match client.create_issue(&title, &body) {
        Ok(number) => eprintln!("filed failure issue #{number} on {tracker}"),
        Err(issue_err) => eprintln!("failed to file failure issue: {issue_err}"),
    }
}
