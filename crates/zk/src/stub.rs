//! Hash-attested stub backend.

use sha2::{Digest, Sha256};

use crate::circuit;
use crate::prover::{
    Certificate, ProofArtifact, ProofBackend, ProofError, Prover, PublicInput, Witness,
};

const DEV_KEY: [u8; 32] = *b"zk/stub-prover/development-key!!";
const TAG_DOMAIN: &[u8] = b"zk/stub/attest/v1";

/// Stub prover for testing and development.
///
/// Every stage relation is evaluated before a certificate is issued, so an
/// artifact only verifies if its witness satisfied the relation. The
/// certificate itself is a keyed SHA-256 tag over the stage, public input
/// and nested binding.
///
/// # Warning
///
/// Do not use in production. Anyone holding the attestation key can forge
/// certificates and nothing about the witness is hidden.
#[derive(Clone)]
pub struct StubProver {
    key: [u8; 32],
}

impl StubProver {
    /// Stub prover with the shared development key.
    pub fn new() -> Self {
        Self { key: DEV_KEY }
    }

    /// Stub prover with a caller-chosen attestation key. Artifacts only
    /// verify under the key they were produced with.
    pub fn with_key(key: [u8; 32]) -> Self {
        Self { key }
    }

    fn attest(&self, public_input: &PublicInput, certificate: &Certificate) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(TAG_DOMAIN);
        hasher.update(self.key);
        hasher.update([certificate.stage.tag()]);
        hasher.update(public_input.to_bytes());
        hasher.update(certificate.binding);
        hasher.finalize().into()
    }
}

impl Default for StubProver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StubProver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubProver").finish_non_exhaustive()
    }
}

impl Prover for StubProver {
    fn backend(&self) -> ProofBackend {
        ProofBackend::Stub
    }

    fn prove(
        &self,
        public_input: &PublicInput,
        witness: Witness<'_>,
    ) -> Result<ProofArtifact, ProofError> {
        let stage = witness.stage();
        let binding = circuit::evaluate(public_input, witness, |nested| self.verify(nested))?;

        let mut certificate = Certificate {
            backend: ProofBackend::Stub,
            stage,
            binding,
            tag: [0; 32],
        };
        certificate.tag = self.attest(public_input, &certificate);

        tracing::trace!(%stage, value = public_input.value, "stub proof attested");

        Ok(ProofArtifact {
            public_input: *public_input,
            certificate,
        })
    }

    fn verify(&self, artifact: &ProofArtifact) -> Result<bool, ProofError> {
        if artifact.certificate.backend != ProofBackend::Stub {
            return Err(ProofError::BackendMismatch {
                expected: ProofBackend::Stub,
                found: artifact.certificate.backend,
            });
        }
        Ok(self.attest(&artifact.public_input, &artifact.certificate) == artifact.certificate.tag)
    }
}
