//! Runtime for the action rollup and the reward contract.
//!
//! Wires the pure pieces from `rollup-core` and `zk` to storage, the ledger
//! collaborators and the event bus.
//!
//! Modules are organized by responsibility:
//! - [`repository`] stores dispatched actions and their chain linkage
//! - [`ledger`] holds committed state fields and token balances
//! - [`rollup`] folds pending actions into the committed checkpoint
//! - [`contract`] hosts the counter contract and the reward token
//! - [`events`] provides the topic-based event bus
//! - [`workers`] runs proof composition off the async executor
//! - [`api`] exposes the error types downstream callers handle
pub mod api;
pub mod config;
pub mod contract;
pub mod events;
pub mod ledger;
pub mod repository;
pub mod rollup;
pub mod workers;

pub use api::{ErrorSeverity, Result, RuntimeError};
pub use config::RuntimeConfig;
pub use contract::{CounterContract, REWARD_AMOUNT, RewardToken, SHARED_SECRET};
pub use events::{ContractEvent, Event, EventBus, ProofEvent, RollupEvent, Topic};
pub use ledger::{
    InMemoryLedger, InMemoryTokenLedger, StateField, StateLedger, StateTransaction, StateValue,
    TokenId, TokenLedger,
};
pub use repository::{
    ActionRepository, FileActionLog, InMemoryActionLog, LogEntry, PendingActions, RepositoryError,
};
pub use rollup::RollupReducer;
pub use workers::{MetricsSnapshot, ProofMetrics, ProofPipeline};
