//! Folding pending actions into the committed checkpoint.
//!
//! A rollup never holds a lock across read → fold → commit. Instead the
//! commit carries preconditions on both checkpoint fields, which the ledger
//! re-checks atomically. Of two rollups racing from the same checkpoint,
//! exactly one commits; the other sees `StaleCheckpoint` and may retry from
//! the fresh committed state.

use std::sync::Arc;

use rollup_core::{ChainPointer, Checkpoint, Field, ReducePolicy};
use tracing::{debug, info, warn};

use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, RollupEvent};
use crate::ledger::{StateField, StateLedger, StateTransaction};
use crate::repository::ActionRepository;

pub struct RollupReducer<P: ReducePolicy> {
    policy: P,
    log: Arc<dyn ActionRepository<P::Action>>,
    ledger: Arc<dyn StateLedger>,
    events: EventBus,
}

impl<P> RollupReducer<P>
where
    P: ReducePolicy<State = Field>,
{
    pub fn new(
        policy: P,
        log: Arc<dyn ActionRepository<P::Action>>,
        ledger: Arc<dyn StateLedger>,
        events: EventBus,
    ) -> Self {
        Self {
            policy,
            log,
            ledger,
            events,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn log(&self) -> &Arc<dyn ActionRepository<P::Action>> {
        &self.log
    }

    /// The checkpoint currently stored in the ledger.
    pub fn committed(&self) -> Result<Checkpoint<Field>> {
        let state = self.ledger.read_field(StateField::Counter)?;
        let pointer = self.ledger.read_pointer(StateField::ActionsHash)?;
        Ok(Checkpoint::new(state, pointer))
    }

    /// Folds every action since `checkpoint` and commits the result.
    ///
    /// Returns `checkpoint` unchanged, without writing, when nothing is
    /// pending. Fails with `StaleCheckpoint` if `checkpoint` is not the
    /// committed one, either up front or at commit time.
    pub fn rollup(&self, checkpoint: &Checkpoint<Field>) -> Result<Checkpoint<Field>> {
        let committed = self.committed()?;
        if committed != *checkpoint {
            return Err(self.stale(checkpoint, committed.pointer));
        }

        let pending = self.log.actions_since(&checkpoint.pointer)?;
        if pending.is_empty() {
            debug!(
                policy = self.policy.name(),
                pointer = %checkpoint.pointer.short(),
                "nothing to roll up"
            );
            return Ok(checkpoint.clone());
        }

        let next = checkpoint.fold(&self.policy, pending.as_slice());
        debug_assert_eq!(next.pointer, pending.end());

        let transaction = StateTransaction::new()
            .require(StateField::Counter, checkpoint.state)
            .require(StateField::ActionsHash, checkpoint.pointer)
            .set(StateField::Counter, next.state)
            .set(StateField::ActionsHash, next.pointer);

        match self.ledger.commit(transaction) {
            Ok(()) => {}
            Err(RuntimeError::PreconditionFailed { .. }) => {
                let committed = self.committed()?;
                return Err(self.stale(checkpoint, committed.pointer));
            }
            Err(e) => return Err(e),
        }

        info!(
            policy = self.policy.name(),
            folded = pending.len(),
            state = %next.state,
            pointer = %next.pointer.short(),
            "rollup committed"
        );
        self.events.publish(Event::Rollup(RollupEvent::RolledUp {
            from: checkpoint.clone(),
            to: next.clone(),
            folded: pending.len(),
        }));

        Ok(next)
    }

    /// Rolls up from the committed checkpoint, retrying lost races.
    ///
    /// Makes at most `max_attempts` attempts (at least one). Errors other
    /// than `StaleCheckpoint` are returned immediately.
    pub fn rollup_latest(&self, max_attempts: u32) -> Result<Checkpoint<Field>> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let checkpoint = self.committed()?;
            match self.rollup(&checkpoint) {
                Err(e) if e.is_recoverable() && attempt < max_attempts => {
                    debug!(attempt, error = %e, "retrying rollup");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn stale(&self, checkpoint: &Checkpoint<Field>, committed: ChainPointer) -> RuntimeError {
        warn!(
            expected = %checkpoint.pointer.short(),
            committed = %committed.short(),
            "stale checkpoint rejected"
        );
        self.events.publish(Event::Rollup(RollupEvent::RollupRejected {
            checkpoint: checkpoint.clone(),
        }));
        RuntimeError::StaleCheckpoint {
            expected: checkpoint.pointer,
            committed,
        }
    }
}
