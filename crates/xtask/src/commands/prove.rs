//! Compose the three-stage proof chain
//!
//! Drives the async proof pipeline with the stub backend, prints each
//! stage as it completes and optionally redeems the result against a
//! throwaway reward token.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use rollup_core::Field;
use runtime::{
    Event, EventBus, InMemoryTokenLedger, ProofEvent, ProofPipeline, RewardToken, SHARED_SECRET,
    Topic,
};
use zk::{PrivateKey, Prover, StubProver};

/// Compose and optionally redeem a proof chain
#[derive(Debug, Parser)]
pub struct Prove {
    /// Seed for a deterministic signing key (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Secret signed by the owner
    #[arg(long, default_value_t = SHARED_SECRET.value())]
    secret: u64,

    /// Value exposed by the ownership stage
    #[arg(long, default_value = "8")]
    base: u64,

    /// Write the merged artifact as JSON
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Redeem the merged artifact against a fresh reward token
    #[arg(long)]
    redeem: bool,
}

impl Prove {
    pub fn execute(self) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
        runtime.block_on(self.run())
    }

    async fn run(self) -> Result<()> {
        let key = self
            .seed
            .map(PrivateKey::from_seed)
            .unwrap_or_else(PrivateKey::random);
        let events = EventBus::new();
        let mut progress = events.subscribe(Topic::Proof);
        let prover: Arc<dyn Prover> = Arc::new(StubProver::new());
        let pipeline = ProofPipeline::new(Arc::clone(&prover), events.clone());

        println!("{} {}", style("Owner:").bold().cyan(), key.public_key());
        println!();

        let result = pipeline
            .compose(key.clone(), Field::new(self.secret), self.base)
            .await;

        while let Ok(event) = progress.try_recv() {
            match event {
                Event::Proof(ProofEvent::StageCompleted {
                    stage,
                    value,
                    proving_time_ms,
                }) => println!(
                    "  {} {:<18} value {:>12}  {}",
                    style("✓").green(),
                    stage,
                    value,
                    style(format!("{proving_time_ms} ms")).dim()
                ),
                Event::Proof(ProofEvent::Failed { stage, error }) => println!(
                    "  {} {:<18} {}",
                    style("✗").red(),
                    stage,
                    style(error).red()
                ),
                _ => {}
            }
        }
        let proof = result?;

        let metrics = pipeline.metrics().snapshot();
        println!();
        println!(
            "{} {:?}",
            style("Average stage time:").bold().cyan(),
            metrics.avg_proving_time
        );

        if let Some(out) = &self.out {
            let json = serde_json::to_string_pretty(&proof.merged)
                .context("Failed to serialize artifact")?;
            std::fs::write(out, json)
                .with_context(|| format!("Failed to write: {}", out.display()))?;
            println!("{} {}", style("Artifact:").bold().cyan(), out.display());
        }

        if self.redeem {
            let reward = RewardToken::new(
                PrivateKey::random().public_key(),
                prover,
                Arc::new(InMemoryTokenLedger::new()),
                events,
            );
            match reward.reward_recursive_proof(key.public_key(), &proof.merged) {
                Ok(balance) => println!(
                    "{} {}",
                    style("Reward balance:").bold().cyan(),
                    style(balance).green()
                ),
                Err(e) => println!(
                    "{} {} ({})",
                    style("Reward rejected:").bold().red(),
                    e,
                    e.severity().as_str()
                ),
            }
        }

        Ok(())
    }
}
