//! Universal prover interface for the recursive proof chain.
//!
//! Defines the artifact format shared by every stage and the interface
//! implemented by all proving backends.

use core::fmt;

use rollup_core::Field;
use serde::{Deserialize, Serialize};

use crate::identity::{PrivateKey, PublicKey, Signature};

/// Public input shared by every stage of the chain.
///
/// Only `value` changes from stage to stage; the signature and key are
/// carried through so the final artifact still names its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInput {
    pub signature: Signature,
    pub public_key: PublicKey,
    pub value: u64,
}

impl PublicInput {
    pub const fn new(signature: Signature, public_key: PublicKey, value: u64) -> Self {
        Self {
            signature,
            public_key,
            value,
        }
    }

    pub const fn with_value(self, value: u64) -> Self {
        Self { value, ..self }
    }

    /// Canonical bytes committed to by attestations.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(64 + 32 + 8);
        bytes.extend_from_slice(&self.signature.to_bytes());
        bytes.extend_from_slice(self.public_key.as_bytes());
        bytes.extend_from_slice(&self.value.to_le_bytes());
        bytes
    }
}

/// Identifies which proving backend generated a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofBackend {
    Stub,
}

/// Position of an artifact in the recursive chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Ownership,
    SignedComputation,
    Merge,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Ownership => "ownership",
            Stage::SignedComputation => "signed-computation",
            Stage::Merge => "merge",
        }
    }

    pub(crate) const fn tag(self) -> u8 {
        match self {
            Stage::Ownership => 0,
            Stage::SignedComputation => 1,
            Stage::Merge => 2,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque backend certificate.
///
/// `binding` commits to the certificates of nested artifacts without
/// exposing them; `tag` is the backend's attestation over everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub backend: ProofBackend,
    pub stage: Stage,
    pub binding: [u8; 32],
    pub tag: [u8; 32],
}

/// ZK proof data container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub public_input: PublicInput,
    pub certificate: Certificate,
}

impl ProofArtifact {
    pub fn stage(&self) -> Stage {
        self.certificate.stage
    }

    pub fn value(&self) -> u64 {
        self.public_input.value
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofError> {
        bincode::serialize(self).map_err(|e| ProofError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        bincode::deserialize(bytes).map_err(|e| ProofError::Serialization(e.to_string()))
    }
}

/// Hidden inputs for one stage.
#[derive(Debug, Clone, Copy)]
pub enum Witness<'a> {
    Ownership {
        private_key: &'a PrivateKey,
    },
    SignedComputation {
        private_key: &'a PrivateKey,
        secret: Field,
        prior: &'a ProofArtifact,
    },
    Merge {
        left: &'a ProofArtifact,
        right: &'a ProofArtifact,
    },
}

impl Witness<'_> {
    pub const fn stage(&self) -> Stage {
        match self {
            Witness::Ownership { .. } => Stage::Ownership,
            Witness::SignedComputation { .. } => Stage::SignedComputation,
            Witness::Merge { .. } => Stage::Merge,
        }
    }
}

/// Errors that can occur during proof generation or verification.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("{stage} constraint violated: {reason}")]
    ConstraintViolation { stage: Stage, reason: String },

    #[error("{stage} stage: nested proof failed verification")]
    NestedVerification { stage: Stage },

    #[error("backend mismatch: expected {expected:?}, got {found:?}")]
    BackendMismatch {
        expected: ProofBackend,
        found: ProofBackend,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ProofError {
    pub(crate) fn violation(stage: Stage, reason: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            stage,
            reason: reason.into(),
        }
    }
}

/// Universal prover interface for all proving backends.
pub trait Prover: Send + Sync {
    fn backend(&self) -> ProofBackend;

    /// Proves that `witness` satisfies its stage relation for
    /// `public_input`.
    ///
    /// Fails without producing an artifact when any constraint is
    /// unsatisfied.
    fn prove(
        &self,
        public_input: &PublicInput,
        witness: Witness<'_>,
    ) -> Result<ProofArtifact, ProofError>;

    /// Verifies an artifact's certificate.
    ///
    /// `Ok(false)` means the certificate is well-formed but does not attest
    /// this public input. Artifacts from another backend are an error.
    fn verify(&self, artifact: &ProofArtifact) -> Result<bool, ProofError>;
}

impl<P: Prover + ?Sized> Prover for std::sync::Arc<P> {
    fn backend(&self) -> ProofBackend {
        (**self).backend()
    }

    fn prove(
        &self,
        public_input: &PublicInput,
        witness: Witness<'_>,
    ) -> Result<ProofArtifact, ProofError> {
        (**self).prove(public_input, witness)
    }

    fn verify(&self, artifact: &ProofArtifact) -> Result<bool, ProofError> {
        (**self).verify(artifact)
    }
}
