//! Committed state paired with the log position it reflects.

use serde::{Deserialize, Serialize};

use crate::chain::ChainPointer;
use crate::reducer::{ReducePolicy, reduce};

/// A state value and the pointer of the last action folded into it.
///
/// A checkpoint is only meaningful for the log it was produced from: folding
/// the actions after `pointer` must start from exactly this `state`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint<S> {
    pub state: S,
    pub pointer: ChainPointer,
}

impl<S> Checkpoint<S> {
    pub const fn new(state: S, pointer: ChainPointer) -> Self {
        Self { state, pointer }
    }

    /// Checkpoint over the empty log.
    pub const fn genesis(state: S) -> Self {
        Self {
            state,
            pointer: ChainPointer::INITIAL,
        }
    }
}

impl<S: Clone> Checkpoint<S> {
    /// Folds `pending` on top of this checkpoint.
    ///
    /// Returns the new checkpoint with the pointer advanced over every
    /// pending action. An empty `pending` returns an equal checkpoint.
    pub fn fold<P>(&self, policy: &P, pending: &[P::Action]) -> Self
    where
        P: ReducePolicy<State = S> + ?Sized,
    {
        Self {
            state: reduce(policy, &self.state, pending),
            pointer: self.pointer.advance_all(pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::reducer::{AdditiveFold, ClampedCounter};

    #[test]
    fn fold_advances_state_and_pointer() {
        let genesis = Checkpoint::genesis(Field::ZERO);
        let actions = [Field::new(1), Field::new(2)];

        let next = genesis.fold(&AdditiveFold, &actions);

        assert_eq!(next.state, Field::new(3));
        assert_eq!(next.pointer, ChainPointer::INITIAL.advance_all(&actions));
    }

    #[test]
    fn empty_fold_is_identity() {
        let checkpoint = Checkpoint::genesis(Field::new(5));
        assert_eq!(checkpoint.fold(&ClampedCounter, &[]), checkpoint);
    }

    #[test]
    fn two_step_fold_matches_single_fold() {
        let actions = [true, true, false, false, false, true];
        let genesis = Checkpoint::genesis(Field::ZERO);

        let once = genesis.fold(&ClampedCounter, &actions);
        let twice = genesis
            .fold(&ClampedCounter, &actions[..3])
            .fold(&ClampedCounter, &actions[3..]);

        assert_eq!(once, twice);
        assert_eq!(once.state, Field::ONE);
    }
}
