//! ZK proof generation utilities.
//!
//! This crate provides the recursive proof chain that gates reward
//! transitions:
//!
//! - [`identity`]: key ownership and signatures over field messages
//! - [`prover`]: public inputs, artifacts and the backend-agnostic
//!   [`Prover`] trait
//! - [`circuit`]: the three stage relations
//! - [`stub`]: hash-attested [`StubProver`] for development and tests
//! - [`composer`]: [`ProofComposer`], chaining ownership, signed computation
//!   and merge proofs
//!
//! # Examples
//!
//! ```
//! use rollup_core::Field;
//! use zk::{PrivateKey, ProofComposer, StubProver};
//!
//! let composer = ProofComposer::new(StubProver::new());
//! let key = PrivateKey::from_seed(1);
//! let proof = composer.compose(&key, Field::new(1111), 8).unwrap();
//! assert_eq!(proof.merged.value(), 512);
//! ```

pub mod circuit;
pub mod composer;
pub mod identity;
pub mod prover;
pub mod stub;

pub use composer::{ChainInputs, ComposedProof, ProofComposer, chain_values};
pub use identity::{PrivateKey, PublicKey, Signature, derive_public_key, sign, verify_signature};
pub use prover::{
    Certificate, ProofArtifact, ProofBackend, ProofError, Prover, PublicInput, Stage, Witness,
};
pub use stub::StubProver;
