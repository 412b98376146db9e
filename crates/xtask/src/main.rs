//! Development tasks for the rollup workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;
mod logging;

use anyhow::Result;
use clap::Parser;
use commands::{Clean, InspectProof, Prove, ReadActions, Simulate};

/// Development tasks for the rollup workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for the action rollup", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Mirror logs to the cache directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Dispatch actions to a file-backed log and roll them up
    Simulate(Simulate),

    /// Read and verify an action log file
    ReadActions(ReadActions),

    /// Compose the three-stage proof chain
    Prove(Prove),

    /// Inspect and verify a proof artifact
    InspectProof(InspectProof),

    /// Delete action logs and xtask logs
    Clean(Clean),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for ROLLUP_DATA_DIR and other env vars)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = logging::init(cli.verbose, cli.log_file)?;

    match cli.command {
        Command::Simulate(cmd) => cmd.execute(),
        Command::ReadActions(cmd) => cmd.execute(),
        Command::Prove(cmd) => cmd.execute(),
        Command::InspectProof(cmd) => cmd.run(),
        Command::Clean(cmd) => cmd.execute(),
    }
}
