//! Arena of log entries addressed by chain pointer.

use std::collections::HashMap;

use rollup_core::{Action, ChainPointer};

use super::types::{LogEntry, PendingActions};
use super::{RepositoryError, Result};

/// Retained log suffix plus a pointer → position index.
///
/// `base` is the pointer preceding the first retained entry: `INITIAL` for a
/// fresh log, or the compaction point after [`ChainIndex::compact`]. The
/// index maps `base` to 0 and each entry's pointer to its position + 1, so
/// a lookup yields where the unconsumed suffix begins.
#[derive(Debug)]
pub(crate) struct ChainIndex<A> {
    base: ChainPointer,
    entries: Vec<LogEntry<A>>,
    positions: HashMap<ChainPointer, usize>,
}

impl<A: Action> ChainIndex<A> {
    pub(crate) fn new(base: ChainPointer) -> Self {
        let mut positions = HashMap::new();
        positions.insert(base, 0);
        Self {
            base,
            entries: Vec::new(),
            positions,
        }
    }

    pub(crate) fn base(&self) -> ChainPointer {
        self.base
    }

    pub(crate) fn tail(&self) -> ChainPointer {
        self.entries
            .last()
            .map(|entry| entry.pointer)
            .unwrap_or(self.base)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[LogEntry<A>] {
        &self.entries
    }

    /// Entry for `action` appended at the current tail.
    pub(crate) fn next_entry(&self, action: A) -> LogEntry<A> {
        let pointer = self.tail().advance(&action);
        LogEntry { action, pointer }
    }

    /// Appends an entry produced by [`next_entry`](Self::next_entry).
    pub(crate) fn push(&mut self, entry: LogEntry<A>) {
        self.positions.insert(entry.pointer, self.entries.len() + 1);
        self.entries.push(entry);
    }

    /// Appends a stored entry, checking its pointer against the chain.
    pub(crate) fn push_verified(&mut self, entry: LogEntry<A>) -> Result<()> {
        let expected = self.tail().advance(&entry.action);
        if entry.pointer != expected {
            return Err(RepositoryError::CorruptedData(format!(
                "entry {} stores pointer {} but the chain gives {}",
                self.entries.len(),
                entry.pointer.short(),
                expected.short()
            )));
        }
        self.push(entry);
        Ok(())
    }

    pub(crate) fn position(&self, pointer: &ChainPointer) -> Result<usize> {
        self.positions
            .get(pointer)
            .copied()
            .ok_or(RepositoryError::UnknownPointer(*pointer))
    }

    pub(crate) fn actions_since(&self, pointer: &ChainPointer) -> Result<PendingActions<A>> {
        let position = self.position(pointer)?;
        let actions = self.entries[position..]
            .iter()
            .map(|entry| entry.action.clone())
            .collect();
        Ok(PendingActions::new(*pointer, self.tail(), actions))
    }

    /// Drops every entry at or before `through`; returns how many.
    pub(crate) fn compact(&mut self, through: &ChainPointer) -> Result<usize> {
        let position = self.position(through)?;
        if position == 0 {
            return Ok(0);
        }

        let removed: Vec<_> = self.entries.drain(..position).collect();
        self.positions.remove(&self.base);
        for entry in &removed[..removed.len() - 1] {
            self.positions.remove(&entry.pointer);
        }

        self.base = *through;
        for slot in self.positions.values_mut() {
            *slot -= position;
        }

        Ok(removed.len())
    }
}
