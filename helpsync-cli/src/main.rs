//! Helpsync — keep vendored help docs in sync with their upstream source.
//!
//! # Usage
//!
//! ```text
//! helpsync init [--force]
//! helpsync check [--branch <name>] [--json]
//! helpsync upgrade [--branch <name>] [--dry-run]
//! ```
//!
//! Configuration lives at `~/.helpsync/config.yml` (see `helpsync init`);
//! `GITHUB_TOKEN` supplies API and push credentials, and a set `CI` variable
//! enables credential-file provisioning and failure-issue reporting.

mod commands;
mod credentials;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, init::InitArgs, upgrade::UpgradeArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "helpsync",
    version,
    about = "Keep a docs site's vendored upstream snapshot current via pull requests",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter configuration file to edit before first use.
    Init(InitArgs),

    /// Report whether an upgrade is needed, without mutating any remote.
    Check(CheckArgs),

    /// Check and, when needed, converge to exactly one open upgrade PR.
    Upgrade(UpgradeArgs),
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Upgrade(args) => args.run(),
    }
}
