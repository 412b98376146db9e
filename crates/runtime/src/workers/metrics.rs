//! Proof pipeline metrics.
//!
//! Counters are atomics so the pipeline and any observer can share one
//! instance without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use zk::Stage;

#[derive(Debug, Default)]
pub struct ProofMetrics {
    /// Completed stages, indexed by [`stage_index`].
    completed: [AtomicU64; 3],

    failed: AtomicU64,

    /// Stages currently running on the blocking pool
    in_flight: AtomicU64,

    peak_in_flight: AtomicU64,

    /// Sum of successful proving times, in nanoseconds
    total_proving_time_nanos: AtomicU64,
}

const fn stage_index(stage: Stage) -> usize {
    match stage {
        Stage::Ownership => 0,
        Stage::SignedComputation => 1,
        Stage::Merge => 2,
    }
}

impl ProofMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a stage as started and tracks the in-flight peak.
    pub fn begin_stage(&self) {
        let depth = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(depth, Ordering::Relaxed);
    }

    pub fn end_stage(&self) {
        // Never underflows as long as every end pairs with a begin.
        let _ = self
            .in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn record_success(&self, stage: Stage, proving_time: Duration) {
        self.completed[stage_index(stage)].fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(proving_time.as_nanos()).unwrap_or(u64::MAX);
        self.total_proving_time_nanos
            .fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed(&self, stage: Stage) -> u64 {
        self.completed[stage_index(stage)].load(Ordering::Relaxed)
    }

    /// Completed stages across the whole chain.
    pub fn generated(&self) -> u64 {
        self.completed
            .iter()
            .map(|count| count.load(Ordering::Relaxed))
            .sum()
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn peak_in_flight(&self) -> u64 {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    pub fn avg_proving_time(&self) -> Duration {
        let generated = self.generated();
        if generated == 0 {
            Duration::ZERO
        } else {
            let total_nanos = self.total_proving_time_nanos.load(Ordering::Relaxed);
            Duration::from_nanos(total_nanos / generated)
        }
    }

    /// Percentage of stages that succeeded; 100 when nothing ran yet.
    pub fn success_rate(&self) -> f64 {
        let generated = self.generated();
        let total = generated + self.failed();
        if total == 0 {
            100.0
        } else {
            (generated as f64 / total as f64) * 100.0
        }
    }

    /// Fields are read one by one; the snapshot is not atomic as a whole.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ownership: self.completed(Stage::Ownership),
            signed_computation: self.completed(Stage::SignedComputation),
            merge: self.completed(Stage::Merge),
            failed: self.failed(),
            in_flight: self.in_flight(),
            peak_in_flight: self.peak_in_flight(),
            avg_proving_time: self.avg_proving_time(),
            success_rate: self.success_rate(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub ownership: u64,
    pub signed_computation: u64,
    pub merge: u64,
    pub failed: u64,
    pub in_flight: u64,
    pub peak_in_flight: u64,
    pub avg_proving_time: Duration,
    pub success_rate: f64,
}
