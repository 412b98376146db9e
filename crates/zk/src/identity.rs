//! Key ownership and signatures over field messages.
//!
//! Backed by ed25519. Messages are sequences of [`Field`] values encoded as
//! concatenated little-endian words, so signing `[secret]` and verifying
//! against `[secret]` agree on every platform.

use core::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use rollup_core::Field;
use serde::{Deserialize, Serialize};

/// Secret signing key. Never serialized.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Generates a key from the operating system RNG.
    pub fn random() -> Self {
        Self(SigningKey::generate(&mut OsRng))
    }

    /// Deterministic key for tests and local simulations.
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut secret = [0u8; ed25519_dalek::SECRET_KEY_LENGTH];
        rng.fill_bytes(&mut secret);
        Self(SigningKey::from_bytes(&secret))
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(SigningKey::from_bytes(bytes))
    }

    pub fn public_key(&self) -> PublicKey {
        derive_public_key(self)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// Compressed ed25519 public key. Doubles as an account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Detached ed25519 signature, stored as its `R` and `s` components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }

    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self { r, s }
    }

    fn to_dalek(self) -> ed25519_dalek::Signature {
        ed25519_dalek::Signature::from_components(self.r, self.s)
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(signature: ed25519_dalek::Signature) -> Self {
        Self {
            r: *signature.r_bytes(),
            s: *signature.s_bytes(),
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.r[..8]))
    }
}

fn encode_message(message: &[Field]) -> Vec<u8> {
    message.iter().flat_map(|field| field.to_le_bytes()).collect()
}

pub fn derive_public_key(private_key: &PrivateKey) -> PublicKey {
    PublicKey(private_key.0.verifying_key().to_bytes())
}

pub fn sign(private_key: &PrivateKey, message: &[Field]) -> Signature {
    private_key.0.sign(&encode_message(message)).into()
}

/// Returns `false` for malformed keys as well as bad signatures.
pub fn verify_signature(signature: &Signature, public_key: &PublicKey, message: &[Field]) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    key.verify_strict(&encode_message(message), &signature.to_dalek())
        .is_ok()
}
