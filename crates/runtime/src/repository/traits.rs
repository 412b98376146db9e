//! Repository contract for the append-only action log.

use rollup_core::{Action, ChainPointer};

use super::Result;
use super::types::PendingActions;

/// Append-only store of dispatched actions, addressed by chain pointer.
///
/// Every method takes `&self`; implementations synchronize internally so a
/// single log can be shared between dispatching callers and reducers.
///
/// # Pointers
///
/// `dispatch` returns the pointer right after the new entry. Any pointer a
/// log has returned (plus its base, `INITIAL` for a fresh log) can be handed
/// back to `actions_since` until it is compacted away.
pub trait ActionRepository<A: Action>: Send + Sync {
    /// Appends `action` at the tail and returns the new tail pointer.
    ///
    /// A failed dispatch leaves no entry behind.
    fn dispatch(&self, action: A) -> Result<ChainPointer>;

    /// Actions appended after `pointer`, oldest first.
    ///
    /// Fails with `UnknownPointer` if `pointer` matches no retained prefix.
    fn actions_since(&self, pointer: &ChainPointer) -> Result<PendingActions<A>>;

    /// Pointer after the newest entry.
    fn tail(&self) -> Result<ChainPointer>;

    /// Number of retained entries.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drops entries at or before `through`, which stays resolvable.
    ///
    /// Returns the number of entries removed. Pointers issued before
    /// `through` stop resolving.
    fn compact(&self, through: &ChainPointer) -> Result<usize>;
}
