//! Async proof pipeline.
//!
//! Runs the three composition stages in order, each on tokio's blocking
//! pool, and reports progress on the proof topic. A failed stage stops the
//! chain; later stages never start.

use std::sync::Arc;
use std::time::Instant;

use rollup_core::Field;
use tracing::{debug, error, info};
use zk::{
    ChainInputs, ComposedProof, PrivateKey, ProofArtifact, ProofComposer, ProofError, Prover,
    Stage,
};

use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, ProofEvent};
use crate::workers::ProofMetrics;

pub type SharedComposer = ProofComposer<Arc<dyn Prover>>;

pub struct ProofPipeline {
    composer: Arc<SharedComposer>,
    events: EventBus,
    metrics: Arc<ProofMetrics>,
}

impl ProofPipeline {
    pub fn new(prover: Arc<dyn Prover>, events: EventBus) -> Self {
        Self {
            composer: Arc::new(ProofComposer::new(prover)),
            events,
            metrics: Arc::new(ProofMetrics::new()),
        }
    }

    /// Shared handle for querying metrics while the pipeline runs.
    pub fn metrics(&self) -> Arc<ProofMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn composer(&self) -> &SharedComposer {
        &self.composer
    }

    /// Composes ownership, signed computation and merge proofs for
    /// `base_value`, signing `[secret]` with `private_key`.
    pub async fn compose(
        &self,
        private_key: PrivateKey,
        secret: Field,
        base_value: u64,
    ) -> Result<ComposedProof> {
        let inputs = ChainInputs::new(&private_key, secret, base_value)?;
        let owner = inputs.ownership.public_key;
        info!(%owner, base_value, "proof composition started");

        let key = private_key.clone();
        let ownership = self
            .run_stage(Stage::Ownership, move |composer| {
                composer.prove_ownership(&inputs.ownership, &key)
            })
            .await?;

        let prior = ownership.clone();
        let signed = self
            .run_stage(Stage::SignedComputation, move |composer| {
                composer.prove_signed_computation(&inputs.signed, &private_key, secret, &prior)
            })
            .await?;

        let (left, right) = (ownership.clone(), signed.clone());
        let merged = self
            .run_stage(Stage::Merge, move |composer| {
                composer.merge(&inputs.merge, &left, &right)
            })
            .await?;

        info!(%owner, value = inputs.merge.value, "proof composition finished");
        Ok(ComposedProof {
            ownership,
            signed,
            merged,
        })
    }

    async fn run_stage<F>(&self, stage: Stage, job: F) -> Result<ProofArtifact>
    where
        F: FnOnce(&SharedComposer) -> std::result::Result<ProofArtifact, ProofError>
            + Send
            + 'static,
    {
        self.events
            .publish(Event::Proof(ProofEvent::StageStarted { stage }));
        self.metrics.begin_stage();

        let composer = Arc::clone(&self.composer);
        let outcome = tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let result = job(&composer);
            (result, started.elapsed())
        })
        .await;
        self.metrics.end_stage();

        let (result, elapsed) = match outcome {
            Ok(done) => done,
            Err(join) => {
                error!(%stage, error = %join, "proof task failed to join");
                self.fail(stage, join.to_string());
                return Err(RuntimeError::WorkerJoin(join));
            }
        };

        match result {
            Ok(artifact) => {
                let proving_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                debug!(%stage, value = artifact.value(), proving_time_ms, "stage proved");
                self.metrics.record_success(stage, elapsed);
                self.events
                    .publish(Event::Proof(ProofEvent::StageCompleted {
                        stage,
                        value: artifact.value(),
                        proving_time_ms,
                    }));
                Ok(artifact)
            }
            Err(e) => {
                error!(%stage, error = %e, "stage proof failed");
                self.fail(stage, e.to_string());
                Err(e.into())
            }
        }
    }

    fn fail(&self, stage: Stage, error: String) {
        self.metrics.record_failure();
        self.events
            .publish(Event::Proof(ProofEvent::Failed { stage, error }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;
    use zk::StubProver;

    #[tokio::test]
    async fn test_pipeline_emits_stage_events_in_order() {
        let events = EventBus::new();
        let mut proofs = events.subscribe(Topic::Proof);
        let pipeline = ProofPipeline::new(Arc::new(StubProver::new()), events);

        let proof = pipeline
            .compose(PrivateKey::from_seed(1), Field::new(1111), 3)
            .await
            .unwrap();
        assert_eq!(proof.merged.value(), 3 * 24);

        let mut completed = Vec::new();
        while let Ok(event) = proofs.try_recv() {
            if let Event::Proof(ProofEvent::StageCompleted { stage, value, .. }) = event {
                completed.push((stage, value));
            }
        }
        assert_eq!(
            completed,
            vec![
                (Stage::Ownership, 3),
                (Stage::SignedComputation, 24),
                (Stage::Merge, 72),
            ]
        );
        assert_eq!(pipeline.metrics().generated(), 3);
        assert_eq!(pipeline.metrics().in_flight(), 0);
    }

    #[tokio::test]
    async fn test_overflowing_base_value_fails_before_proving() {
        let pipeline = ProofPipeline::new(Arc::new(StubProver::new()), EventBus::new());
        let result = pipeline
            .compose(PrivateKey::from_seed(1), Field::new(1111), u64::MAX)
            .await;

        assert!(matches!(result, Err(RuntimeError::Proof(_))));
        assert_eq!(pipeline.metrics().generated(), 0);
    }
}
