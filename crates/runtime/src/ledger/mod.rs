//! Ledger collaborators: committed state fields and token balances.

mod state;
mod token;

pub use state::{InMemoryLedger, StateField, StateLedger, StateTransaction, StateValue};
pub use token::{InMemoryTokenLedger, TokenId, TokenLedger};
