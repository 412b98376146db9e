//! Read and inspect action log files
//!
//! Opening a log replays and re-hashes every entry, so a log that reads
//! cleanly here is also one the runtime accepts.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use rollup_core::{AdditiveFold, ClampedCounter, Field, ReducePolicy, reduce};
use runtime::config::action_log_name;
use runtime::{ActionRepository, FileActionLog, LogEntry};
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};

use super::PolicyArg;
use crate::dirs;

/// Read and inspect action log files
#[derive(Parser)]
pub struct ReadActions {
    /// Policy whose log to read (selects the action type)
    #[arg(short, long, value_enum, default_value = "additive")]
    policy: PolicyArg,

    /// Read this log file instead of the policy's log in the data directory
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,

    /// Limit number of actions to display (0 = unlimited)
    #[arg(short, long, default_value = "100")]
    limit: usize,

    /// Skip first N actions
    #[arg(long, default_value = "0")]
    skip: usize,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Summary view (entry count and folded value)
    Summary,
    /// List all actions with their pointers
    List,
    /// Full JSON output
    Json,
}

impl ReadActions {
    pub fn execute(self) -> Result<()> {
        let path = match &self.file {
            Some(file) => file.clone(),
            None => dirs::runtime_config(self.data_dir.clone())
                .data_dir
                .join(action_log_name(self.policy.name())),
        };
        if !path.exists() {
            anyhow::bail!("Action log not found: {}", path.display());
        }

        match self.policy {
            PolicyArg::Additive => self.show(AdditiveFold, &path),
            PolicyArg::Clamped => self.show(ClampedCounter, &path),
        }
    }

    fn show<P>(&self, policy: P, path: &Path) -> Result<()>
    where
        P: ReducePolicy<State = Field>,
        P::Action: Serialize + DeserializeOwned,
    {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Invalid log path: {}", path.display()))?;
        let log = FileActionLog::<P::Action>::open(dir, filename)
            .with_context(|| format!("Failed to open action log: {}", path.display()))?;

        let base = log.base()?;
        let entries = log.entries()?;
        println!("{} {}", style("Action Log:").bold().cyan(), path.display());
        println!("{} {}", style("Policy:").bold().cyan(), policy.name());
        println!(
            "{} {}{}",
            style("Base:").bold().cyan(),
            base.short(),
            if base.is_initial() { " (initial)" } else { " (compacted)" }
        );
        println!("{} {}", style("Tail:").bold().cyan(), log.tail()?.short());
        println!("{} {}", style("Entries:").bold().cyan(), entries.len());
        println!();

        let shown: Vec<_> = entries
            .iter()
            .skip(self.skip)
            .take(if self.limit == 0 {
                usize::MAX
            } else {
                self.limit
            })
            .collect();

        match self.format {
            OutputFormat::Summary => print_summary(&policy, &entries),
            OutputFormat::List => print_list(&shown, self.skip),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&shown)
                    .context("Failed to serialize entries")?;
                println!("{json}");
            }
        }

        Ok(())
    }
}

fn print_summary<P>(policy: &P, entries: &[LogEntry<P::Action>])
where
    P: ReducePolicy<State = Field>,
{
    let folded = reduce(policy, &policy.genesis(), entries.iter().map(|e| &e.action));
    println!(
        "{} {}",
        style("Folded from genesis:").bold().cyan(),
        style(folded).green()
    );
    if let Some(last) = entries.last() {
        println!(
            "{} {:?}",
            style("Last action:").bold().cyan(),
            last.action
        );
    }
}

fn print_list<A: std::fmt::Debug>(entries: &[&LogEntry<A>], offset: usize) {
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "{:>6}  {:<12} {} {}",
            style(format!("#{}", offset + i)).dim(),
            format!("{:?}", entry.action),
            style("→").cyan(),
            entry.pointer.short()
        );
    }
}
