//! Records stored by action log repositories.

use rollup_core::ChainPointer;
use serde::{Deserialize, Serialize};

/// One dispatched action and the chain pointer right after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry<A> {
    pub action: A,
    pub pointer: ChainPointer,
}

/// Snapshot of the actions appended after a given pointer.
///
/// The snapshot is detached from the log: it can be iterated any number of
/// times and later dispatches do not affect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingActions<A> {
    start: ChainPointer,
    end: ChainPointer,
    actions: Vec<A>,
}

impl<A> PendingActions<A> {
    pub(crate) fn new(start: ChainPointer, end: ChainPointer, actions: Vec<A>) -> Self {
        Self {
            start,
            end,
            actions,
        }
    }

    /// Pointer the snapshot starts after.
    pub fn start(&self) -> ChainPointer {
        self.start
    }

    /// Tail pointer at the time of the snapshot.
    pub fn end(&self) -> ChainPointer {
        self.end
    }

    pub fn as_slice(&self) -> &[A] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, A> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn into_vec(self) -> Vec<A> {
        self.actions
    }
}

impl<'a, A> IntoIterator for &'a PendingActions<A> {
    type Item = &'a A;
    type IntoIter = std::slice::Iter<'a, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
