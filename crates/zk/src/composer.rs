//! Three-stage recursive proof composition.
//!
//! ```text
//! ownership(v0) ──► signed computation(v1 = 8·v0) ──┐
//!        │                                          ▼
//!        └────────────────────────────────► merge(v2 = v0·v1)
//! ```
//!
//! The composer only assembles public inputs and witnesses; every
//! constraint is enforced by the backend when it proves a stage.

use rollup_core::Field;

use crate::circuit::COMPUTATION_FACTOR;
use crate::identity::{PrivateKey, sign};
use crate::prover::{ProofArtifact, ProofError, Prover, PublicInput, Stage, Witness};

/// Every artifact produced by [`ProofComposer::compose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedProof {
    pub ownership: ProofArtifact,
    pub signed: ProofArtifact,
    pub merged: ProofArtifact,
}

impl ComposedProof {
    /// The aggregate artifact consumed by the reward transition.
    pub fn into_final(self) -> ProofArtifact {
        self.merged
    }
}

#[derive(Debug, Clone)]
pub struct ProofComposer<P> {
    prover: P,
}

impl<P: Prover> ProofComposer<P> {
    pub fn new(prover: P) -> Self {
        Self { prover }
    }

    pub fn prover(&self) -> &P {
        &self.prover
    }

    /// Base case: proves knowledge of the key behind `public_input.public_key`.
    pub fn prove_ownership(
        &self,
        public_input: &PublicInput,
        private_key: &PrivateKey,
    ) -> Result<ProofArtifact, ProofError> {
        self.prover
            .prove(public_input, Witness::Ownership { private_key })
    }

    /// Step: consumes an ownership proof and multiplies its value by eight.
    pub fn prove_signed_computation(
        &self,
        public_input: &PublicInput,
        private_key: &PrivateKey,
        secret: Field,
        prior: &ProofArtifact,
    ) -> Result<ProofArtifact, ProofError> {
        self.prover.prove(
            public_input,
            Witness::SignedComputation {
                private_key,
                secret,
                prior,
            },
        )
    }

    pub fn merge(
        &self,
        public_input: &PublicInput,
        left: &ProofArtifact,
        right: &ProofArtifact,
    ) -> Result<ProofArtifact, ProofError> {
        self.prover
            .prove(public_input, Witness::Merge { left, right })
    }

    pub fn verify(&self, artifact: &ProofArtifact) -> Result<bool, ProofError> {
        self.prover.verify(artifact)
    }

    /// Runs the whole chain for `base_value`, signing `[secret]` with
    /// `private_key`.
    pub fn compose(
        &self,
        private_key: &PrivateKey,
        secret: Field,
        base_value: u64,
    ) -> Result<ComposedProof, ProofError> {
        let inputs = ChainInputs::new(private_key, secret, base_value)?;

        let ownership = self.prove_ownership(&inputs.ownership, private_key)?;
        tracing::debug!(value = inputs.ownership.value, "ownership proof ready");

        let signed =
            self.prove_signed_computation(&inputs.signed, private_key, secret, &ownership)?;
        tracing::debug!(value = inputs.signed.value, "signed computation proof ready");

        let merged = self.merge(&inputs.merge, &ownership, &signed)?;
        tracing::debug!(value = inputs.merge.value, "merge proof ready");

        Ok(ComposedProof {
            ownership,
            signed,
            merged,
        })
    }
}

/// Public inputs of the three stages of one chain.
///
/// All three carry the same signature over `[secret]` and the owner's key;
/// only the exposed value differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInputs {
    pub ownership: PublicInput,
    pub signed: PublicInput,
    pub merge: PublicInput,
}

impl ChainInputs {
    pub fn new(
        private_key: &PrivateKey,
        secret: Field,
        base_value: u64,
    ) -> Result<Self, ProofError> {
        let (v1, v2) = chain_values(base_value)?;
        let base = PublicInput::new(
            sign(private_key, &[secret]),
            private_key.public_key(),
            base_value,
        );
        Ok(Self {
            ownership: base,
            signed: base.with_value(v1),
            merge: base.with_value(v2),
        })
    }
}

/// Public values of the signed-computation and merge stages for `v0`.
pub fn chain_values(v0: u64) -> Result<(u64, u64), ProofError> {
    let v1 = v0.checked_mul(COMPUTATION_FACTOR).ok_or_else(|| {
        ProofError::violation(Stage::SignedComputation, "prior value overflows")
    })?;
    let v2 = v0
        .checked_mul(v1)
        .ok_or_else(|| ProofError::violation(Stage::Merge, "product overflows"))?;
    Ok((v1, v2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubProver;

    const SECRET: Field = Field::new(1111);

    fn composer() -> ProofComposer<StubProver> {
        ProofComposer::new(StubProver::new())
    }

    #[test]
    fn chain_from_eight_exposes_512() {
        let composer = composer();
        let key = PrivateKey::from_seed(11);

        let proof = composer.compose(&key, SECRET, 8).unwrap();

        assert_eq!(proof.ownership.value(), 8);
        assert_eq!(proof.signed.value(), 64);
        assert_eq!(proof.merged.value(), 512);
        assert_eq!(proof.merged.stage(), Stage::Merge);
        assert!(composer.verify(&proof.merged).unwrap());
        assert_eq!(proof.merged.public_input.public_key, key.public_key());
    }

    #[test]
    fn wrong_multiplier_is_rejected() {
        let composer = composer();
        let key = PrivateKey::from_seed(11);
        let base = PublicInput::new(sign(&key, &[SECRET]), key.public_key(), 8);
        let ownership = composer.prove_ownership(&base, &key).unwrap();

        let err = composer
            .prove_signed_computation(&base.with_value(63), &key, SECRET, &ownership)
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::ConstraintViolation {
                stage: Stage::SignedComputation,
                ..
            }
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let composer = composer();
        let key = PrivateKey::from_seed(11);
        let base = PublicInput::new(sign(&key, &[SECRET]), key.public_key(), 8);
        let ownership = composer.prove_ownership(&base, &key).unwrap();

        let err = composer
            .prove_signed_computation(&base.with_value(64), &key, Field::new(1112), &ownership)
            .unwrap_err();
        assert!(matches!(err, ProofError::ConstraintViolation { .. }));
    }

    #[test]
    fn signature_from_other_key_is_rejected() {
        let composer = composer();
        let key = PrivateKey::from_seed(11);
        let intruder = PrivateKey::from_seed(12);
        let base = PublicInput::new(sign(&key, &[SECRET]), key.public_key(), 8);
        let ownership = composer.prove_ownership(&base, &key).unwrap();

        assert!(
            composer
                .prove_signed_computation(&base.with_value(64), &intruder, SECRET, &ownership)
                .is_err()
        );
    }

    #[test]
    fn tampered_child_breaks_merge() {
        let composer = composer();
        let key = PrivateKey::from_seed(11);
        let proof = composer.compose(&key, SECRET, 8).unwrap();

        let mut forged = proof.signed.clone();
        forged.public_input.value = 65;

        let err = composer
            .merge(
                &proof.ownership.public_input.with_value(8 * 65),
                &proof.ownership,
                &forged,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::NestedVerification {
                stage: Stage::Merge
            }
        ));
    }

    #[test]
    fn merge_product_must_match() {
        let composer = composer();
        let proof = composer.compose(&PrivateKey::from_seed(11), SECRET, 8).unwrap();

        let err = composer
            .merge(
                &proof.ownership.public_input.with_value(513),
                &proof.ownership,
                &proof.signed,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::ConstraintViolation {
                stage: Stage::Merge,
                ..
            }
        ));
    }

    #[test]
    fn merge_rejects_proofs_of_another_owner() {
        let composer = composer();
        let mine = composer.compose(&PrivateKey::from_seed(11), SECRET, 8).unwrap();
        let theirs = composer.compose(&PrivateKey::from_seed(12), SECRET, 8).unwrap();

        let err = composer
            .merge(
                &mine.ownership.public_input.with_value(512),
                &mine.ownership,
                &theirs.signed,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::ConstraintViolation {
                stage: Stage::Merge,
                ..
            }
        ));
    }

    #[test]
    fn signed_stage_requires_ownership_prior() {
        let composer = composer();
        let key = PrivateKey::from_seed(11);
        let proof = composer.compose(&key, SECRET, 8).unwrap();

        // A signed-computation artifact is not a valid base case.
        let err = composer
            .prove_signed_computation(
                &proof.signed.public_input.with_value(512),
                &key,
                SECRET,
                &proof.signed,
            )
            .unwrap_err();
        assert!(matches!(err, ProofError::ConstraintViolation { .. }));
    }

    #[test]
    fn merge_requires_ownership_then_signed_children() {
        let composer = composer();
        let key = PrivateKey::from_seed(11);
        let proof = composer.compose(&key, SECRET, 8).unwrap();
        let input = proof.ownership.public_input;

        // Squaring the ownership value skips the signed stage entirely.
        let err = composer
            .merge(&input.with_value(64), &proof.ownership, &proof.ownership)
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::ConstraintViolation {
                stage: Stage::Merge,
                ..
            }
        ));

        let err = composer
            .merge(&input.with_value(512), &proof.signed, &proof.ownership)
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::ConstraintViolation {
                stage: Stage::Merge,
                ..
            }
        ));
    }

    #[test]
    fn merge_rejects_signed_child_of_another_ownership_proof() {
        let composer = composer();
        let key = PrivateKey::from_seed(11);
        let eight = composer.compose(&key, SECRET, 8).unwrap();
        let two = composer.compose(&key, SECRET, 2).unwrap();

        // Same owner, but the signed proof extends the ownership proof of 2.
        let err = composer
            .merge(
                &eight.ownership.public_input.with_value(8 * 16),
                &eight.ownership,
                &two.signed,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::ConstraintViolation {
                stage: Stage::Merge,
                ..
            }
        ));
    }

    #[test]
    fn chain_inputs_share_owner_and_signature() {
        let key = PrivateKey::from_seed(11);
        let inputs = ChainInputs::new(&key, SECRET, 8).unwrap();

        assert_eq!(
            [inputs.ownership.value, inputs.signed.value, inputs.merge.value],
            [8, 64, 512]
        );
        assert_eq!(inputs.signed.signature, inputs.ownership.signature);
        assert_eq!(inputs.merge.public_key, key.public_key());
    }

    #[test]
    fn overflowing_base_value_fails_before_proving() {
        let err = composer()
            .compose(&PrivateKey::from_seed(11), SECRET, u64::MAX / 4)
            .unwrap_err();
        assert!(matches!(
            err,
            ProofError::ConstraintViolation {
                stage: Stage::SignedComputation,
                ..
            }
        ));
    }
}
