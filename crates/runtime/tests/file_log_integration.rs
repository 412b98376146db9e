//! File-backed action log driven through the counter contract.

use std::sync::Arc;

use rollup_core::{AdditiveFold, ChainPointer, Field};
use runtime::{
    ActionRepository, CounterContract, EventBus, FileActionLog, InMemoryLedger,
    InMemoryTokenLedger, RuntimeError, StateLedger,
};
use tempfile::TempDir;
use zk::PrivateKey;

const LOG: &str = "actions.log";

fn counter_contract(
    log: Arc<FileActionLog<Field>>,
    ledger: Arc<InMemoryLedger>,
) -> CounterContract<AdditiveFold> {
    CounterContract::new(
        PrivateKey::from_seed(1).public_key(),
        AdditiveFold,
        log,
        ledger,
        Arc::new(InMemoryTokenLedger::new()),
        EventBus::new(),
    )
}

#[test]
fn test_pointers_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let ledger = Arc::new(InMemoryLedger::new());

    let issued = {
        let log = Arc::new(FileActionLog::create(dir.path(), LOG).expect("create"));
        let contract = counter_contract(log, ledger.clone());
        contract
            .deploy(PrivateKey::from_seed(2).public_key(), 3)
            .expect("deploy");
        contract.increment_counter().expect("dispatch");
        let issued = contract.increment_counter_by_2().expect("dispatch");
        contract.rollup_latest().expect("rollup");
        contract.increment_counter().expect("dispatch");
        issued
    };

    let log = Arc::new(FileActionLog::<Field>::open(dir.path(), LOG).expect("reopen"));
    assert_eq!(log.len().expect("len"), 3);

    let pending = log.actions_since(&issued).expect("pointer from before reopen");
    assert_eq!(pending.as_slice(), &[Field::ONE]);

    let contract = counter_contract(log.clone(), ledger);
    let next = contract.rollup_latest().expect("rollup after reopen");
    assert_eq!(next.state, Field::new(4));
    assert_eq!(next.pointer, log.tail().expect("tail"));
}

#[test]
fn test_compaction_keeps_committed_pointer_usable() {
    let dir = TempDir::new().expect("tempdir");
    let ledger = Arc::new(InMemoryLedger::new());
    let log = Arc::new(FileActionLog::create(dir.path(), LOG).expect("create"));
    let contract = counter_contract(log.clone(), ledger.clone());
    contract
        .deploy(PrivateKey::from_seed(2).public_key(), 3)
        .expect("deploy");

    for _ in 0..4 {
        contract.increment_counter().expect("dispatch");
    }
    let committed = contract.rollup_latest().expect("rollup");
    assert_eq!(log.compact(&committed.pointer).expect("compact"), 4);
    drop(contract);
    drop(log);

    let log = Arc::new(FileActionLog::<Field>::open(dir.path(), LOG).expect("reopen"));
    assert_eq!(log.base().expect("base"), committed.pointer);
    assert!(matches!(
        log.actions_since(&ChainPointer::INITIAL),
        Err(runtime::RepositoryError::UnknownPointer(_))
    ));

    let contract = counter_contract(log, ledger.clone());
    contract.increment_counter().expect("dispatch");
    let next = contract.rollup_latest().expect("rollup");
    assert_eq!(next.state, Field::new(5));
    assert_eq!(
        ledger
            .read_pointer(runtime::StateField::ActionsHash)
            .expect("pointer"),
        next.pointer
    );
}

#[test]
fn test_committed_pointer_compacted_away_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let log = Arc::new(FileActionLog::create(dir.path(), LOG).expect("create"));
    let contract = counter_contract(log.clone(), Arc::new(InMemoryLedger::new()));
    contract
        .deploy(PrivateKey::from_seed(2).public_key(), 3)
        .expect("deploy");

    contract.increment_counter().expect("dispatch");
    let ahead = contract.increment_counter().expect("dispatch");
    log.compact(&ahead).expect("compact");

    let error = contract.rollup_latest().expect_err("unknown pointer");
    assert!(matches!(error, RuntimeError::UnknownPointer(p) if p == ChainPointer::INITIAL));
    assert!(!error.is_recoverable());
}
