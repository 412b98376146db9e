//! Deterministic rollup primitives shared across the workspace.
//!
//! `rollup-core` defines the canonical rules for turning an append-only list
//! of actions into committed state:
//!
//! - [`ChainPointer`] is a rolling SHA-256 commitment over the action log.
//!   Every append advances it, so a pointer identifies exactly one prefix of
//!   the log.
//! - [`Checkpoint`] pairs a state value with the pointer of the last action
//!   folded into it.
//! - [`ReducePolicy`] describes how a single action changes state. Two
//!   policies ship with the crate: [`AdditiveFold`] and [`ClampedCounter`].
//!
//! Nothing here performs I/O or synchronization; the runtime owns storage and
//! commit ordering and calls into these pure functions.
pub mod action;
pub mod chain;
pub mod checkpoint;
pub mod field;
pub mod reducer;

pub use action::Action;
pub use chain::{ChainPointer, EMPTY_ACTIONS_DOMAIN};
pub use checkpoint::Checkpoint;
pub use field::Field;
pub use reducer::{AdditiveFold, ClampedCounter, ReducePolicy, reduce};
