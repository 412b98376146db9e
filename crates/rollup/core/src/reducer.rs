//! Reduction policies.
//!
//! A policy is a pure `(state, action) -> state` step plus a genesis value.
//! Folding is always left to right in log order; policies are free to be
//! non-commutative (see [`ClampedCounter`]).

use core::fmt;

use crate::action::Action;
use crate::field::Field;

/// How a single action changes committed state.
pub trait ReducePolicy: Send + Sync {
    type Action: Action;
    type State: Clone + fmt::Debug + PartialEq + Send + Sync;

    /// State before any action is folded.
    fn genesis(&self) -> Self::State;

    fn combine(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Short identifier used in tracing spans.
    fn name(&self) -> &'static str;
}

/// Folds `actions` into `state` left to right.
pub fn reduce<'a, P, I>(policy: &P, state: &P::State, actions: I) -> P::State
where
    P: ReducePolicy + ?Sized,
    P::Action: 'a,
    I: IntoIterator<Item = &'a P::Action>,
{
    actions
        .into_iter()
        .fold(state.clone(), |acc, action| policy.combine(&acc, action))
}

/// Adds every action's value to the state.
///
/// Batching-invariant: any split of the same action list, folded batch by
/// batch, yields the same result as folding it in one go.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdditiveFold;

impl ReducePolicy for AdditiveFold {
    type Action = Field;
    type State = Field;

    fn genesis(&self) -> Field {
        Field::ZERO
    }

    fn combine(&self, state: &Field, action: &Field) -> Field {
        *state + *action
    }

    fn name(&self) -> &'static str {
        "additive"
    }
}

/// `true` increments, `false` decrements but never below zero.
///
/// The floor makes this order-sensitive: `[false, true]` ends at 1 while
/// `[true, false]` ends at 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClampedCounter;

impl ReducePolicy for ClampedCounter {
    type Action = bool;
    type State = Field;

    fn genesis(&self) -> Field {
        Field::ZERO
    }

    fn combine(&self, state: &Field, action: &bool) -> Field {
        if *action {
            *state + Field::ONE
        } else {
            state.checked_decrement().unwrap_or(Field::ZERO)
        }
    }

    fn name(&self) -> &'static str {
        "clamped"
    }
}
