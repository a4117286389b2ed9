//! `helpsync check` — upgrade-need detection only, no remote mutation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use helpsync_detector::check_needs_upgrade;
use helpsync_github::GithubClient;

/// Arguments for `helpsync check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Branch to check (defaults to the configured default branch).
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Path to the configuration file (defaults to ~/.helpsync/config.yml).
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config(self.config.as_deref())?;
        let branch = self
            .branch
            .unwrap_or_else(|| config.default_branch.clone());
        let hosting = GithubClient::new(config.upstream.clone(), super::github_token());

        let check = check_needs_upgrade(&hosting, &config, &branch)
            .with_context(|| format!("upgrade check failed for '{branch}'"))?;

        if self.json {
            let payload = serde_json::json!({
                "branch": branch,
                "current": check.current.as_str(),
                "latest": check.latest.as_str(),
                "needs_upgrade": check.needs_upgrade(),
                "reason": check.skip.as_ref().map(|reason| reason.to_string()),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize check JSON")?
            );
            return Ok(());
        }

        match &check.skip {
            Some(reason) => println!(
                "{} '{branch}' — {reason}",
                "✓ no upgrade needed".green()
            ),
            None => println!(
                "{} '{branch}': {} → {}",
                "↑ upgrade needed".yellow(),
                check.current,
                check.latest
            ),
        }
        Ok(())
    }
}
