//! Field-sized integer values.

use core::fmt;
use core::ops::Add;

use serde::{Deserialize, Serialize};

/// A field-sized unsigned value.
///
/// Addition wraps on overflow, mirroring modular field arithmetic. Callers
/// that need bounds must check them explicitly.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Field(u64);

impl Field {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `self - 1`, or `None` at zero.
    pub const fn checked_decrement(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Little-endian encoding used for hashing and signatures.
    pub const fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl Add for Field {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Field> for u64 {
    fn from(value: Field) -> Self {
        value.0
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
