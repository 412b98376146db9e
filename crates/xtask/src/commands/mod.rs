//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod clean;
mod inspect_proof;
mod prove;
mod read_actions;
mod simulate;

pub use clean::Clean;
pub use inspect_proof::InspectProof;
pub use prove::Prove;
pub use read_actions::ReadActions;
pub use simulate::Simulate;

use anyhow::{Context, Result};
use rollup_core::{AdditiveFold, ClampedCounter, ReducePolicy};

/// Reduce policy selectable on the command line
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum PolicyArg {
    /// Integer actions summed into the counter
    Additive,
    /// Increment/decrement actions, floored at zero
    Clamped,
}

impl PolicyArg {
    pub fn name(self) -> &'static str {
        match self {
            PolicyArg::Additive => AdditiveFold.name(),
            PolicyArg::Clamped => ClampedCounter.name(),
        }
    }
}

/// Parses `0x`-prefixed or bare hex into a 32-byte array.
pub fn parse_hex32(input: &str) -> Result<[u8; 32]> {
    let trimmed = input.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed).with_context(|| format!("Invalid hex: {input}"))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("Expected 32 bytes, got {}", bytes.len()))
}
