//! Event types for different topics.

use rollup_core::{ChainPointer, Checkpoint, Field};
use serde::{Deserialize, Serialize};
use zk::{PublicKey, Stage};

/// Action log and checkpoint activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollupEvent {
    /// An action was appended; `pointer` is the new tail.
    ActionDispatched { pointer: ChainPointer },

    /// A rollup committed a new checkpoint.
    RolledUp {
        from: Checkpoint<Field>,
        to: Checkpoint<Field>,
        folded: usize,
    },

    /// A rollup lost the race for `checkpoint`.
    RollupRejected { checkpoint: Checkpoint<Field> },
}

/// State changes emitted by contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    DeployedBy {
        deployer: PublicKey,
        block_height: u32,
    },

    UpdatedNum {
        num: Field,
    },

    RewardTokenSet {
        address: PublicKey,
    },

    RewardMinted {
        recipient: PublicKey,
        amount: u64,
    },

    TokensMinted {
        issuer: PublicKey,
        recipient: PublicKey,
        amount: u64,
    },
}

/// Proof pipeline progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofEvent {
    StageStarted {
        stage: Stage,
    },

    StageCompleted {
        stage: Stage,
        value: u64,
        proving_time_ms: u64,
    },

    Failed {
        stage: Stage,
        error: String,
    },
}
