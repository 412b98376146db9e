//! Composed proofs flowing into the reward transition.

use std::sync::Arc;

use rollup_core::Field;
use runtime::{
    ContractEvent, Event, EventBus, InMemoryTokenLedger, ProofEvent, ProofPipeline,
    REWARD_AMOUNT, RewardToken, RuntimeError, SHARED_SECRET, Topic,
};
use tokio::time::{Duration, timeout};
use zk::{PrivateKey, ProofArtifact, ProofError, Prover, Stage, StubProver};

struct Harness {
    pipeline: ProofPipeline,
    reward: RewardToken,
    events: EventBus,
}

fn harness() -> Harness {
    let events = EventBus::new();
    let prover: Arc<dyn Prover> = Arc::new(StubProver::new());
    Harness {
        pipeline: ProofPipeline::new(Arc::clone(&prover), events.clone()),
        reward: RewardToken::new(
            PrivateKey::from_seed(500).public_key(),
            prover,
            Arc::new(InMemoryTokenLedger::new()),
            events.clone(),
        ),
        events,
    }
}

async fn merged_proof(h: &Harness, key: &PrivateKey, secret: Field) -> ProofArtifact {
    h.pipeline
        .compose(key.clone(), secret, 8)
        .await
        .expect("compose")
        .into_final()
}

#[tokio::test]
async fn test_reward_mints_once_for_owner() {
    let h = harness();
    let mut contract_events = h.events.subscribe(Topic::Contract);
    let owner = PrivateKey::from_seed(1);

    let proof = merged_proof(&h, &owner, SHARED_SECRET).await;
    assert_eq!(proof.value(), 512);
    assert_eq!(proof.stage(), Stage::Merge);

    let balance = h
        .reward
        .reward_recursive_proof(owner.public_key(), &proof)
        .expect("reward");
    assert_eq!(balance, REWARD_AMOUNT);

    let event = timeout(Duration::from_secs(1), contract_events.recv())
        .await
        .expect("event in time")
        .expect("event");
    assert_eq!(
        event,
        Event::Contract(ContractEvent::RewardMinted {
            recipient: owner.public_key(),
            amount: REWARD_AMOUNT,
        })
    );

    assert!(matches!(
        h.reward.reward_recursive_proof(owner.public_key(), &proof),
        Err(RuntimeError::ArtifactReplayed)
    ));
    assert_eq!(
        h.reward.balance_of(&owner.public_key()).expect("balance"),
        REWARD_AMOUNT
    );
}

#[tokio::test]
async fn test_reward_rejects_other_caller() {
    let h = harness();
    let owner = PrivateKey::from_seed(1);
    let thief = PrivateKey::from_seed(2).public_key();
    let proof = merged_proof(&h, &owner, SHARED_SECRET).await;

    let error = h
        .reward
        .reward_recursive_proof(thief, &proof)
        .expect_err("thief");
    assert!(matches!(
        error,
        RuntimeError::UnauthorizedTransition { caller, expected }
            if caller == thief && expected == owner.public_key()
    ));
    assert!(!error.is_recoverable());
    assert_eq!(h.reward.balance_of(&thief).expect("balance"), 0);

    // The owner can still claim after the rejected attempt.
    h.reward
        .reward_recursive_proof(owner.public_key(), &proof)
        .expect("owner reward");
}

#[tokio::test]
async fn test_reward_requires_signature_over_shared_secret() {
    let h = harness();
    let owner = PrivateKey::from_seed(3);
    let proof = merged_proof(&h, &owner, Field::new(2222)).await;

    assert!(matches!(
        h.reward.reward_recursive_proof(owner.public_key(), &proof),
        Err(RuntimeError::SignatureMismatch)
    ));
}

#[tokio::test]
async fn test_reward_requires_the_full_three_stage_chain() {
    let h = harness();
    let owner = PrivateKey::from_seed(7);
    let proof = h
        .pipeline
        .compose(owner.clone(), SHARED_SECRET, 8)
        .await
        .expect("compose");
    let composer = h.pipeline.composer();

    // Merging the ownership proof with itself would skip the signed stage.
    let shortcut = composer.merge(
        &proof.ownership.public_input.with_value(64),
        &proof.ownership,
        &proof.ownership,
    );
    assert!(matches!(
        shortcut,
        Err(ProofError::ConstraintViolation {
            stage: Stage::Merge,
            ..
        })
    ));

    for partial in [&proof.ownership, &proof.signed] {
        assert!(matches!(
            h.reward.reward_recursive_proof(owner.public_key(), partial),
            Err(RuntimeError::ProofVerification(_))
        ));
    }
    assert_eq!(h.reward.balance_of(&owner.public_key()).expect("balance"), 0);

    h.reward
        .reward_recursive_proof(owner.public_key(), &proof.merged)
        .expect("full chain reward");
}

#[tokio::test]
async fn test_tampered_value_fails_verification() {
    let h = harness();
    let owner = PrivateKey::from_seed(4);
    let mut proof = merged_proof(&h, &owner, SHARED_SECRET).await;
    proof.public_input.value = 513;

    assert!(matches!(
        h.reward.reward_recursive_proof(owner.public_key(), &proof),
        Err(RuntimeError::ProofVerification(_))
    ));
}

#[tokio::test]
async fn test_foreign_backend_key_fails_verification() {
    let h = harness();
    let owner = PrivateKey::from_seed(5);
    let foreign = ProofPipeline::new(
        Arc::new(StubProver::with_key([9; 32])),
        EventBus::new(),
    );
    let proof = foreign
        .compose(owner.clone(), SHARED_SECRET, 8)
        .await
        .expect("compose")
        .into_final();

    assert!(matches!(
        h.reward.reward_recursive_proof(owner.public_key(), &proof),
        Err(RuntimeError::ProofVerification(_))
    ));
}

#[tokio::test]
async fn test_pipeline_reports_each_stage() {
    let h = harness();
    let mut proofs = h.events.subscribe(Topic::Proof);
    merged_proof(&h, &PrivateKey::from_seed(6), SHARED_SECRET).await;

    let mut started = Vec::new();
    let mut completed = Vec::new();
    while let Ok(event) = proofs.try_recv() {
        match event {
            Event::Proof(ProofEvent::StageStarted { stage }) => started.push(stage),
            Event::Proof(ProofEvent::StageCompleted { stage, value, .. }) => {
                completed.push((stage, value))
            }
            Event::Proof(ProofEvent::Failed { error, .. }) => panic!("stage failed: {error}"),
            _ => {}
        }
    }

    let order = vec![Stage::Ownership, Stage::SignedComputation, Stage::Merge];
    assert_eq!(started, order);
    assert_eq!(
        completed,
        vec![
            (Stage::Ownership, 8),
            (Stage::SignedComputation, 64),
            (Stage::Merge, 512),
        ]
    );

    let snapshot = h.pipeline.metrics().snapshot();
    assert_eq!(snapshot.merge, 1);
    assert_eq!(snapshot.failed, 0);
}
