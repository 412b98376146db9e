//! Dispatch actions to a file-backed log and roll them up
//!
//! Runs the counter contract against a fresh action log in the data
//! directory. The ledger is in-memory and only lives for the run; the log
//! file stays behind for `read-actions`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use console::style;
use rollup_core::{AdditiveFold, ClampedCounter, Field, ReducePolicy};
use runtime::config::action_log_name;
use runtime::{
    ActionRepository, CounterContract, EventBus, FileActionLog, InMemoryLedger,
    InMemoryTokenLedger, RuntimeConfig,
};
use serde::{Serialize, de::DeserializeOwned};
use zk::PrivateKey;

use super::PolicyArg;
use crate::dirs;

/// Dispatch actions and roll them up
#[derive(Parser, Debug)]
pub struct Simulate {
    /// Comma-separated actions: integers for `additive`, `+`/`-` for `clamped`
    #[arg(value_delimiter = ',', required = true, allow_hyphen_values = true)]
    actions: Vec<String>,

    /// Reduce policy for the counter
    #[arg(short, long, value_enum, default_value = "additive")]
    policy: PolicyArg,

    /// Roll up after every N dispatches (0 = one rollup at the end)
    #[arg(short, long, default_value = "0")]
    batch: usize,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Replace an existing action log
    #[arg(long)]
    force: bool,
}

impl Simulate {
    pub fn execute(self) -> Result<()> {
        let config = dirs::runtime_config(self.data_dir.clone());
        match self.policy {
            PolicyArg::Additive => {
                let actions = self
                    .actions
                    .iter()
                    .map(|raw| parse_additive(raw))
                    .collect::<Result<Vec<_>>>()?;
                self.run(AdditiveFold, actions, &config)
            }
            PolicyArg::Clamped => {
                let actions = self
                    .actions
                    .iter()
                    .map(|raw| parse_clamped(raw))
                    .collect::<Result<Vec<_>>>()?;
                self.run(ClampedCounter, actions, &config)
            }
        }
    }

    fn run<P>(&self, policy: P, actions: Vec<P::Action>, config: &RuntimeConfig) -> Result<()>
    where
        P: ReducePolicy<State = Field>,
        P::Action: Serialize + DeserializeOwned,
    {
        let name = action_log_name(policy.name());
        let path = config.data_dir.join(&name);
        if path.exists() {
            if !self.force {
                bail!(
                    "Action log already exists: {}\nPass --force to replace it.",
                    path.display()
                );
            }
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove: {}", path.display()))?;
        }

        let log = Arc::new(
            FileActionLog::<P::Action>::create(&config.data_dir, &name)
                .with_context(|| format!("Failed to create action log: {}", path.display()))?,
        );
        let contract = CounterContract::new(
            PrivateKey::from_seed(0).public_key(),
            policy,
            log.clone(),
            Arc::new(InMemoryLedger::new()),
            Arc::new(InMemoryTokenLedger::new()),
            EventBus::with_capacity(config.event_capacity),
        )
        .with_retry_limit(config.retry_limit);
        contract.deploy(PrivateKey::from_seed(1).public_key(), 0)?;

        println!("{} {}", style("Policy:").bold().cyan(), contract.reducer().policy().name());
        println!("{} {}", style("Action Log:").bold().cyan(), path.display());
        println!();

        let batch = if self.batch == 0 {
            actions.len().max(1)
        } else {
            self.batch
        };
        for chunk in actions.chunks(batch) {
            for action in chunk {
                contract.dispatch(action.clone())?;
            }
            let checkpoint = contract.rollup_latest()?;
            println!(
                "  {} folded {:>3} → state {:>6}  pointer {}",
                style("✓").green(),
                chunk.len(),
                checkpoint.state,
                style(checkpoint.pointer.short()).dim()
            );

            if config.compact_log {
                let removed = log.compact(&checkpoint.pointer)?;
                tracing::debug!(removed, "compacted action log");
            }
        }

        let committed = contract.committed()?;
        println!();
        println!("{} {}", style("Counter:").bold().cyan(), committed.state);
        println!("{} {}", style("Pointer:").bold().cyan(), committed.pointer);
        println!(
            "{} {}",
            style("Retained Entries:").bold().cyan(),
            log.len()?
        );

        Ok(())
    }
}

fn parse_additive(raw: &str) -> Result<Field> {
    let value = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Invalid additive action: {raw:?}"))?;
    Ok(Field::new(value))
}

fn parse_clamped(raw: &str) -> Result<bool> {
    match raw.trim() {
        "+" | "inc" | "true" => Ok(true),
        "-" | "dec" | "false" => Ok(false),
        other => bail!("Invalid clamped action: {other:?} (expected `+` or `-`)"),
    }
}
