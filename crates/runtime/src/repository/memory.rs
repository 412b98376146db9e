//! In-memory action log for tests and local runs.

use std::sync::RwLock;

use rollup_core::{Action, ChainPointer};

use super::index::ChainIndex;
use super::types::{LogEntry, PendingActions};
use super::{ActionRepository, RepositoryError, Result};

/// In-memory implementation of [`ActionRepository`].
pub struct InMemoryActionLog<A> {
    index: RwLock<ChainIndex<A>>,
}

impl<A: Action> InMemoryActionLog<A> {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self {
            index: RwLock::new(ChainIndex::new(ChainPointer::INITIAL)),
        }
    }

    /// Copy of the retained entries, oldest first.
    pub fn entries(&self) -> Result<Vec<LogEntry<A>>> {
        let index = self
            .index
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(index.entries().to_vec())
    }
}

impl<A: Action> Default for InMemoryActionLog<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> ActionRepository<A> for InMemoryActionLog<A> {
    fn dispatch(&self, action: A) -> Result<ChainPointer> {
        let mut index = self
            .index
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let entry = index.next_entry(action);
        let pointer = entry.pointer;
        index.push(entry);

        tracing::debug!(pointer = %pointer.short(), len = index.len(), "action dispatched");
        Ok(pointer)
    }

    fn actions_since(&self, pointer: &ChainPointer) -> Result<PendingActions<A>> {
        let index = self
            .index
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        index.actions_since(pointer)
    }

    fn tail(&self) -> Result<ChainPointer> {
        let index = self
            .index
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(index.tail())
    }

    fn len(&self) -> Result<usize> {
        let index = self
            .index
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(index.len())
    }

    fn compact(&self, through: &ChainPointer) -> Result<usize> {
        let mut index = self
            .index
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let removed = index.compact(through)?;
        tracing::debug!(removed, base = %through.short(), "action log compacted");
        Ok(removed)
    }
}
