//! Clean action logs and xtask logs
//!
//! Safety: Always prompts for confirmation before deletion.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use rollup_core::{AdditiveFold, ClampedCounter, ReducePolicy};
use runtime::config::action_log_name;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::dirs;

/// Clean action logs and xtask logs
#[derive(Parser, Debug)]
pub struct Clean {
    /// Clean only xtask logs (cache directory)
    #[arg(long)]
    pub logs: bool,

    /// Clean only action logs (data directory)
    #[arg(long)]
    pub data: bool,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Skip confirmation prompt (dangerous!)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

enum Target {
    Dir(PathBuf),
    File(PathBuf),
}

impl Target {
    fn path(&self) -> &PathBuf {
        match self {
            Target::Dir(path) | Target::File(path) => path,
        }
    }

    fn remove(&self) -> io::Result<()> {
        match self {
            Target::Dir(path) => std::fs::remove_dir_all(path),
            Target::File(path) => std::fs::remove_file(path),
        }
    }
}

impl Clean {
    pub fn execute(self) -> Result<()> {
        // If no flags specified, clean both
        let clean_logs = self.logs || !self.data;
        let clean_data = self.data || !self.logs;

        let mut targets = Vec::new();

        if clean_logs {
            let log_dir = dirs::log_dir();
            if log_dir.exists() {
                targets.push(("xtask logs".to_string(), Target::Dir(log_dir)));
            }
        }

        if clean_data {
            // Only the files this workspace writes; the data directory may be shared.
            let data_dir = dirs::runtime_config(self.data_dir.clone()).data_dir;
            for policy in [AdditiveFold.name(), ClampedCounter.name()] {
                let path = data_dir.join(action_log_name(policy));
                if path.exists() {
                    targets.push((format!("{policy} action log"), Target::File(path)));
                }
            }
        }

        if targets.is_empty() {
            println!("{}", style("Nothing to clean").dim());
            return Ok(());
        }

        println!("{}", style("Clean rollup data").yellow().bold());
        println!();
        println!("The following will be deleted:");
        for (label, target) in &targets {
            println!("  {} {}", style("→").cyan(), style(label).bold());
            println!("    {}", style(target.path().display()).dim());
        }
        println!();

        if !self.yes && !confirm()? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        for (label, target) in targets {
            print!("Deleting {}... ", label);
            io::stdout().flush()?;

            target
                .remove()
                .with_context(|| format!("Failed to delete: {}", target.path().display()))?;

            println!("{}", style("✓").green());
        }

        Ok(())
    }
}

/// Prompt user for confirmation
fn confirm() -> Result<bool> {
    print!("{} ", style("Proceed? [y/N]").yellow().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
