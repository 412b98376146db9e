//! Rolling SHA-256 commitment over the action log.
//!
//! The chain starts at [`ChainPointer::INITIAL`] and every appended action
//! advances it:
//!
//! ```text
//! next = SHA256(ACTION_DOMAIN || prev || len(encoded) as u64 LE || encoded)
//! ```
//!
//! The length prefix keeps variable-width encodings from colliding, and the
//! domain tag separates chain hashes from any other SHA-256 use in the
//! workspace.

use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::action::Action;

/// Preimage of [`ChainPointer::INITIAL`].
pub const EMPTY_ACTIONS_DOMAIN: &[u8] = b"rollup-core/actions/empty";

const ACTION_DOMAIN: &[u8] = b"rollup-core/actions/append";

/// Commitment to a prefix of the action log.
///
/// Two pointers are equal iff they commit to the same ordered list of
/// actions (up to SHA-256 collisions).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainPointer([u8; 32]);

impl ChainPointer {
    /// Pointer of the empty log: `SHA256("rollup-core/actions/empty")`.
    pub const INITIAL: Self = Self([
        0xbb, 0xae, 0x66, 0x84, 0xc3, 0x97, 0xef, 0xa6, 0x1e, 0xe7, 0x15, 0x11, 0xce, 0xe4, 0x5a,
        0x9e, 0xcc, 0x4f, 0xa3, 0x00, 0x2c, 0xe8, 0x93, 0x88, 0x6d, 0xfc, 0x0d, 0x53, 0xa5, 0x52,
        0x46, 0x99,
    ]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_initial(&self) -> bool {
        *self == Self::INITIAL
    }

    /// Pointer after appending `action` to the log ending at `self`.
    pub fn advance<A: Action>(&self, action: &A) -> Self {
        let encoded = action.encode();

        let mut hasher = Sha256::new();
        hasher.update(ACTION_DOMAIN);
        hasher.update(self.0);
        hasher.update((encoded.len() as u64).to_le_bytes());
        hasher.update(&encoded);

        Self(hasher.finalize().into())
    }

    /// Pointer after appending every action in order.
    pub fn advance_all<'a, A, I>(&self, actions: I) -> Self
    where
        A: Action + 'a,
        I: IntoIterator<Item = &'a A>,
    {
        actions
            .into_iter()
            .fold(*self, |pointer, action| pointer.advance(action))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 bytes as hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Default for ChainPointer {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Debug for ChainPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainPointer({})", self.short())
    }
}

impl fmt::Display for ChainPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    #[test]
    fn initial_is_hash_of_empty_domain() {
        let digest: [u8; 32] = Sha256::digest(EMPTY_ACTIONS_DOMAIN).into();
        assert_eq!(ChainPointer::INITIAL.as_bytes(), &digest);
        assert!(ChainPointer::default().is_initial());
    }

    #[test]
    fn advance_is_deterministic() {
        let a = ChainPointer::INITIAL.advance(&Field::ONE);
        let b = ChainPointer::INITIAL.advance(&Field::ONE);
        assert_eq!(a, b);
        assert_ne!(a, ChainPointer::INITIAL);
    }

    #[test]
    fn order_of_actions_matters() {
        let one = Field::new(1);
        let two = Field::new(2);

        let forward = ChainPointer::INITIAL.advance_all([&one, &two]);
        let backward = ChainPointer::INITIAL.advance_all([&two, &one]);
        assert_ne!(forward, backward);
    }

    #[test]
    fn advance_all_matches_stepwise_advance() {
        let actions = [Field::new(1), Field::new(2), Field::new(1)];
        let stepwise = actions
            .iter()
            .fold(ChainPointer::INITIAL, |p, a| p.advance(a));
        assert_eq!(ChainPointer::INITIAL.advance_all(&actions), stepwise);
    }

    #[test]
    fn distinct_payload_types_do_not_collide() {
        let as_bool = ChainPointer::INITIAL.advance(&true);
        let as_field = ChainPointer::INITIAL.advance(&Field::ONE);
        assert_ne!(as_bool, as_field);
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(
            ChainPointer::INITIAL.to_hex(),
            "bbae6684c397efa61ee71511cee45a9ecc4fa3002ce893886dfc0d53a5524699"
        );
        assert_eq!(ChainPointer::INITIAL.short(), "bbae6684c397efa6");
    }
}
