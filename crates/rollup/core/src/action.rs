//! Action payloads and their canonical encoding.
//!
//! Actions are opaque to the log: all it needs is a stable byte encoding to
//! feed into the hash chain. The encoding must be infallible and identical on
//! every machine, which is why it is a dedicated trait instead of a serde
//! round trip.

use core::fmt;

use crate::field::Field;

/// A payload that can be appended to the action log.
pub trait Action: Clone + fmt::Debug + Send + Sync + 'static {
    /// Canonical bytes hashed into the action chain.
    fn encode(&self) -> Vec<u8>;
}

impl Action for Field {
    fn encode(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl Action for bool {
    fn encode(&self) -> Vec<u8> {
        vec![u8::from(*self)]
    }
}
