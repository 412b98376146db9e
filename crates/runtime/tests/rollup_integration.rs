//! Rollup behavior through the counter contract.
//!
//! Covers batching invariance, the pointer produced by an end-to-end
//! rollup, the optimistic race between concurrent reducers, and dispatches
//! racing a rollup.

use std::sync::{Arc, Barrier};

use rollup_core::{AdditiveFold, ChainPointer, ClampedCounter, Field, ReducePolicy};
use runtime::{
    ActionRepository, CounterContract, Event, EventBus, InMemoryActionLog, InMemoryLedger, InMemoryTokenLedger,
    RollupEvent, RuntimeError, Topic,
};
use zk::PrivateKey;

fn deployed<P: ReducePolicy<State = Field>>(policy: P, events: EventBus) -> CounterContract<P> {
    let contract = CounterContract::new(
        PrivateKey::from_seed(1).public_key(),
        policy,
        Arc::new(InMemoryActionLog::new()),
        Arc::new(InMemoryLedger::new()),
        Arc::new(InMemoryTokenLedger::new()),
        events,
    );
    contract
        .deploy(PrivateKey::from_seed(2).public_key(), 1)
        .expect("deploy");
    contract
}

#[test]
fn test_three_increments_roll_up_to_chained_pointer() {
    let contract = deployed(AdditiveFold, EventBus::new());
    let prior = contract.committed().expect("committed");

    for _ in 0..3 {
        contract.increment_counter().expect("dispatch");
    }
    let next = contract.rollup(&prior).expect("rollup");

    let one = Field::ONE;
    let expected = prior.pointer.advance(&one).advance(&one).advance(&one);
    assert_eq!(next.state, prior.state + Field::new(3));
    assert_eq!(next.pointer, expected);
    assert_eq!(contract.committed().expect("committed"), next);
}

#[test]
fn test_split_rollups_match_single_rollup() {
    let actions = [3u64, 1, 4, 1, 5, 9, 2, 6];

    let single = deployed(AdditiveFold, EventBus::new());
    for value in actions {
        single.dispatch(Field::new(value)).expect("dispatch");
    }
    let once = single.rollup_latest().expect("rollup");

    for split in 0..=actions.len() {
        let batched = deployed(AdditiveFold, EventBus::new());
        for value in &actions[..split] {
            batched.dispatch(Field::new(*value)).expect("dispatch");
        }
        batched.rollup_latest().expect("first rollup");
        for value in &actions[split..] {
            batched.dispatch(Field::new(*value)).expect("dispatch");
        }
        let twice = batched.rollup_latest().expect("second rollup");

        assert_eq!(twice, once, "split at {split}");
    }
}

#[test]
fn test_clamped_counter_floors_before_increments() {
    let contract = deployed(ClampedCounter, EventBus::new());
    contract.decrease_counter().expect("dispatch");
    contract.decrease_counter().expect("dispatch");
    contract.increment_counter().expect("dispatch");

    let next = contract.rollup_latest().expect("rollup");
    assert_eq!(next.state, Field::ONE);
}

#[tokio::test]
async fn test_concurrent_rollups_commit_exactly_once() {
    const RACERS: usize = 8;

    let contract = Arc::new(deployed(AdditiveFold, EventBus::new()));
    for _ in 0..5 {
        contract.increment_counter().expect("dispatch");
    }
    let checkpoint = contract.committed().expect("committed");
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let contract = Arc::clone(&contract);
            let barrier = Arc::clone(&barrier);
            let checkpoint = checkpoint.clone();
            tokio::task::spawn_blocking(move || {
                barrier.wait();
                contract.rollup(&checkpoint)
            })
        })
        .collect();

    let mut committed = 0;
    let mut stale = 0;
    for handle in handles {
        match handle.await.expect("join") {
            Ok(next) => {
                assert_eq!(next.state, Field::new(5));
                committed += 1;
            }
            Err(RuntimeError::StaleCheckpoint { .. }) => stale += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(committed, 1);
    assert_eq!(stale, RACERS - 1);
    assert_eq!(contract.counter().expect("counter"), Field::new(5));
}

#[tokio::test]
async fn test_dispatches_racing_rollups_are_not_lost() {
    const DISPATCHERS: u64 = 4;
    const PER_DISPATCHER: u64 = 25;
    const ROLLERS: usize = 2;

    let log = Arc::new(InMemoryActionLog::<Field>::new());
    let contract = Arc::new(CounterContract::new(
        PrivateKey::from_seed(1).public_key(),
        AdditiveFold,
        log.clone(),
        Arc::new(InMemoryLedger::new()),
        Arc::new(InMemoryTokenLedger::new()),
        EventBus::new(),
    ));
    contract
        .deploy(PrivateKey::from_seed(2).public_key(), 1)
        .expect("deploy");
    let barrier = Arc::new(Barrier::new(DISPATCHERS as usize + ROLLERS));

    let mut handles = Vec::new();
    for _ in 0..DISPATCHERS {
        let contract = Arc::clone(&contract);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::task::spawn_blocking(move || {
            barrier.wait();
            for value in 1..=PER_DISPATCHER {
                contract.dispatch(Field::new(value)).expect("dispatch");
            }
        }));
    }
    for _ in 0..ROLLERS {
        let contract = Arc::clone(&contract);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::task::spawn_blocking(move || {
            barrier.wait();
            for _ in 0..20 {
                match contract.rollup_latest() {
                    Ok(_) | Err(RuntimeError::StaleCheckpoint { .. }) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
        }));
    }
    for handle in handles {
        handle.await.expect("join");
    }

    let last = contract.rollup_latest().expect("final rollup");
    let total = DISPATCHERS * PER_DISPATCHER * (PER_DISPATCHER + 1) / 2;
    assert_eq!(last.state, Field::new(total));
    assert_eq!(last.pointer, log.tail().expect("tail"));
    assert_eq!(contract.counter().expect("counter"), Field::new(total));
    assert_eq!(log.len().expect("len"), (DISPATCHERS * PER_DISPATCHER) as usize);
}

#[tokio::test]
async fn test_stale_rollup_is_reported_on_the_bus() {
    let events = EventBus::new();
    let mut rollups = events.subscribe(Topic::Rollup);
    let contract = deployed(AdditiveFold, events);

    let genesis = contract.committed().expect("committed");
    contract.increment_counter_by_2().expect("dispatch");
    let committed = contract.rollup(&genesis).expect("rollup");
    contract.increment_counter().expect("dispatch");

    let result = contract.rollup(&genesis);
    assert!(matches!(
        result,
        Err(RuntimeError::StaleCheckpoint { expected, committed: c })
            if expected == ChainPointer::INITIAL && c == committed.pointer
    ));
    assert_eq!(contract.committed().expect("committed"), committed);

    let mut rejected = false;
    while let Ok(event) = rollups.try_recv() {
        if let Event::Rollup(RollupEvent::RollupRejected { checkpoint }) = event {
            assert_eq!(checkpoint, genesis);
            rejected = true;
        }
    }
    assert!(rejected);
}

#[test]
fn test_forged_checkpoint_is_rejected_as_stale() {
    let contract = deployed(AdditiveFold, EventBus::new());
    let forged = rollup_core::Checkpoint::new(Field::ZERO, ChainPointer::from_bytes([7; 32]));

    let error = contract.rollup(&forged).expect_err("forged checkpoint");
    assert!(matches!(error, RuntimeError::StaleCheckpoint { .. }));
    assert!(error.is_recoverable());
}
