//! `helpsync init` — write a starter configuration file.

use anyhow::{bail, Context, Result};
use clap::Args;

use helpsync_core::{config, SyncConfig};

/// Arguments for `helpsync init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let path = config::config_path().context("could not determine config path")?;
        if path.exists() && !self.force {
            bail!(
                "config already exists at {}; pass --force to overwrite",
                path.display()
            );
        }

        let written = config::save(&SyncConfig::starter()).context("failed to write config")?;
        println!("✓ Wrote starter config to {}", written.display());
        println!("  Edit the repository ids and tracked-file settings before running `helpsync upgrade`.");
        Ok(())
    }
}
