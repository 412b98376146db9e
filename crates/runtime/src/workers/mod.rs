//! Background work that should not block callers.
//!
//! Proving is CPU-bound, so the pipeline hands each stage to the blocking
//! pool and reports through the event bus.

mod metrics;
mod prover;

pub use metrics::{MetricsSnapshot, ProofMetrics};
pub use prover::{ProofPipeline, SharedComposer};
