//! Contracts built on the rollup reducer and the ledgers.
mod counter;
mod reward;

pub use counter::{CounterContract, MINT_AMOUNT, NUM_GENESIS, REWARD_SHARE_DIVISOR};
pub use reward::{REWARD_AMOUNT, RewardToken, SHARED_SECRET, secret_commitment};
