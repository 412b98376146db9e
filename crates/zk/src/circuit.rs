//! Stage relations of the recursive proof chain.
//!
//! Each stage is a predicate over `(public_input, witness)`. Backends call
//! [`evaluate`] before producing a certificate, so an artifact can only
//! exist for a satisfied relation.
//!
//! ```text
//! ownership          derive_public_key(sk) == pi.public_key
//! signed computation verify(prior) ∧ prior is ownership
//!                    ∧ derive_public_key(sk) == pi.public_key
//!                    ∧ verify_signature(pi.signature, pi.public_key, [secret])
//!                    ∧ pi.value == prior.value * 8
//! merge              verify(left) ∧ verify(right)
//!                    ∧ left is ownership ∧ right is signed computation
//!                    ∧ right.value == left.value * 8
//!                    ∧ pi.value == left.value * right.value
//! ```
//!
//! Every nested artifact must carry the same public key and signature as
//! the stage consuming it, so one owner's proofs cannot be spliced into
//! another owner's chain.
//!
//! Nested artifacts never leak into the public input: the relation returns
//! a binding digest over their certificates, which the backend folds into
//! its own attestation.

use sha2::{Digest, Sha256};

use crate::identity::{derive_public_key, verify_signature};
use crate::prover::{ProofArtifact, ProofError, PublicInput, Stage, Witness};

/// Multiplier applied by the signed-computation stage.
pub const COMPUTATION_FACTOR: u64 = 8;

const BINDING_DOMAIN: &[u8] = b"zk/binding/v1";

/// Checks the stage relation selected by `witness`.
///
/// `verify_nested` is the backend's own verifier, applied to every nested
/// artifact. Returns the binding digest on success.
pub fn evaluate<V>(
    public_input: &PublicInput,
    witness: Witness<'_>,
    verify_nested: V,
) -> Result<[u8; 32], ProofError>
where
    V: Fn(&ProofArtifact) -> Result<bool, ProofError>,
{
    let stage = witness.stage();
    match witness {
        Witness::Ownership { private_key } => {
            if derive_public_key(private_key) != public_input.public_key {
                return Err(ProofError::violation(
                    stage,
                    "private key does not derive the public key",
                ));
            }
            Ok(binding(stage, &[]))
        }

        Witness::SignedComputation {
            private_key,
            secret,
            prior,
        } => {
            require_verified(stage, prior, &verify_nested)?;
            require_stage(stage, prior, Stage::Ownership)?;

            require_same_owner(stage, prior, public_input)?;
            if derive_public_key(private_key) != public_input.public_key {
                return Err(ProofError::violation(
                    stage,
                    "private key does not derive the public key",
                ));
            }
            if !verify_signature(&public_input.signature, &public_input.public_key, &[secret]) {
                return Err(ProofError::violation(stage, "signature does not verify"));
            }

            let expected = prior
                .value()
                .checked_mul(COMPUTATION_FACTOR)
                .ok_or_else(|| ProofError::violation(stage, "prior value overflows"))?;
            if public_input.value != expected {
                return Err(ProofError::violation(
                    stage,
                    format!("value {} != {expected}", public_input.value),
                ));
            }

            Ok(binding(stage, &[prior]))
        }

        Witness::Merge { left, right } => {
            require_verified(stage, left, &verify_nested)?;
            require_verified(stage, right, &verify_nested)?;
            require_stage(stage, left, Stage::Ownership)?;
            require_stage(stage, right, Stage::SignedComputation)?;
            require_same_owner(stage, left, public_input)?;
            require_same_owner(stage, right, public_input)?;

            // The signed child must extend this ownership proof, not another one.
            if left.value().checked_mul(COMPUTATION_FACTOR) != Some(right.value()) {
                return Err(ProofError::violation(
                    stage,
                    format!(
                        "signed value {} does not extend ownership value {}",
                        right.value(),
                        left.value()
                    ),
                ));
            }

            let expected = left
                .value()
                .checked_mul(right.value())
                .ok_or_else(|| ProofError::violation(stage, "product overflows"))?;
            if public_input.value != expected {
                return Err(ProofError::violation(
                    stage,
                    format!("value {} != {expected}", public_input.value),
                ));
            }

            Ok(binding(stage, &[left, right]))
        }
    }
}

fn require_verified<V>(stage: Stage, artifact: &ProofArtifact, verify: &V) -> Result<(), ProofError>
where
    V: Fn(&ProofArtifact) -> Result<bool, ProofError>,
{
    match verify(artifact) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ProofError::NestedVerification { stage }),
        Err(e) => {
            tracing::debug!(%stage, error = %e, "nested verification errored");
            Err(ProofError::NestedVerification { stage })
        }
    }
}

fn require_stage(stage: Stage, nested: &ProofArtifact, expected: Stage) -> Result<(), ProofError> {
    if nested.stage() != expected {
        return Err(ProofError::violation(
            stage,
            format!("expected a {expected} proof, got {}", nested.stage()),
        ));
    }
    Ok(())
}

fn require_same_owner(
    stage: Stage,
    nested: &ProofArtifact,
    public_input: &PublicInput,
) -> Result<(), ProofError> {
    let owner = &nested.public_input;
    if owner.public_key != public_input.public_key || owner.signature != public_input.signature {
        return Err(ProofError::violation(
            stage,
            format!("nested {} proof belongs to another owner", nested.stage()),
        ));
    }
    Ok(())
}

fn binding(stage: Stage, nested: &[&ProofArtifact]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(BINDING_DOMAIN);
    hasher.update([stage.tag()]);
    for artifact in nested {
        hasher.update(artifact.public_input.to_bytes());
        hasher.update([artifact.stage().tag()]);
        hasher.update(artifact.certificate.binding);
        hasher.update(artifact.certificate.tag);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{PrivateKey, sign};
    use rollup_core::Field;

    fn accept_all(_: &ProofArtifact) -> Result<bool, ProofError> {
        Ok(true)
    }

    fn reject_all(_: &ProofArtifact) -> Result<bool, ProofError> {
        Ok(false)
    }

    fn input(key: &PrivateKey, value: u64) -> PublicInput {
        PublicInput::new(sign(key, &[Field::new(1111)]), key.public_key(), value)
    }

    #[test]
    fn ownership_requires_matching_key() {
        let key = PrivateKey::from_seed(1);
        let other = PrivateKey::from_seed(2);
        let public_input = input(&key, 8);

        assert!(evaluate(&public_input, Witness::Ownership { private_key: &key }, accept_all).is_ok());

        let err = evaluate(&public_input, Witness::Ownership { private_key: &other }, accept_all)
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::ConstraintViolation {
                stage: Stage::Ownership,
                ..
            }
        ));
    }

    #[test]
    fn merge_rejects_unverified_children() {
        use crate::prover::{Certificate, ProofBackend};

        let key = PrivateKey::from_seed(1);
        let child = ProofArtifact {
            public_input: input(&key, 8),
            certificate: Certificate {
                backend: ProofBackend::Stub,
                stage: Stage::Ownership,
                binding: [0; 32],
                tag: [0; 32],
            },
        };

        let err = evaluate(
            &input(&key, 64),
            Witness::Merge {
                left: &child,
                right: &child,
            },
            reject_all,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProofError::NestedVerification {
                stage: Stage::Merge
            }
        ));
    }
}
