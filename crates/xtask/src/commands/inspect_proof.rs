//! Inspect and debug proof artifacts
//!
//! Loads a JSON artifact written by `prove --out`, prints its public input
//! and certificate, and re-checks it the way the reward token would.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use rollup_core::Field;
use runtime::SHARED_SECRET;
use std::path::PathBuf;
use zk::{ProofArtifact, Prover, PublicKey, Stage, StubProver, verify_signature};

use super::parse_hex32;

#[derive(Debug, Parser)]
pub struct InspectProof {
    /// JSON artifact file
    path: PathBuf,

    /// Hex-encoded 32-byte attestation key (defaults to the development key)
    #[arg(long, value_name = "HEX")]
    key: Option<String>,

    /// Check the reward transition for this caller (hex public key)
    #[arg(long, value_name = "HEX")]
    caller: Option<String>,

    /// Secret the caller is expected to have signed
    #[arg(long, default_value_t = SHARED_SECRET.value())]
    secret: u64,
}

impl InspectProof {
    pub fn run(&self) -> Result<()> {
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read: {}", self.path.display()))?;
        let artifact: ProofArtifact =
            serde_json::from_str(&json).context("Failed to parse proof artifact")?;

        let input = &artifact.public_input;
        let cert = &artifact.certificate;
        println!("{} {}", style("Stage:").bold().cyan(), artifact.stage());
        println!("{} {:?}", style("Backend:").bold().cyan(), cert.backend);
        println!("{} {}", style("Value:").bold().cyan(), input.value);
        println!("{} {}", style("Public key:").bold().cyan(), input.public_key);
        println!(
            "{} {}",
            style("Signature:").bold().cyan(),
            hex::encode(input.signature.to_bytes())
        );
        println!("{} {}", style("Binding:").bold().cyan(), hex::encode(cert.binding));
        println!("{} {}", style("Tag:").bold().cyan(), hex::encode(cert.tag));
        println!();

        let prover = match &self.key {
            Some(key) => StubProver::with_key(parse_hex32(key)?),
            None => StubProver::new(),
        };
        let verified = prover.verify(&artifact).context("Verification failed")?;
        report("certificate verifies", verified);

        if let Some(caller) = &self.caller {
            let caller = PublicKey::from_bytes(parse_hex32(caller)?);
            report("merge stage", artifact.stage() == Stage::Merge);
            report("caller owns proof", input.public_key == caller);
            report(
                "signature over secret",
                verify_signature(&input.signature, &caller, &[Field::new(self.secret)]),
            );
        }

        Ok(())
    }
}

fn report(check: &str, ok: bool) {
    if ok {
        println!("  {} {}", style("✓").green(), check);
    } else {
        println!("  {} {}", style("✗").red(), style(check).red());
    }
}
