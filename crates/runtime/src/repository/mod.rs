//! Repository layer for the action log.
//!
//! Repositories own the dispatched actions and their chain linkage; the
//! committed checkpoint lives in the ledger, not here.

mod error;
mod file;
mod index;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::FileActionLog;
pub use memory::InMemoryActionLog;
pub use traits::ActionRepository;
pub use types::{LogEntry, PendingActions};
