//! Error types raised by repository implementations.

use rollup_core::ChainPointer;
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("action log lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("log already exists: {0}")]
    LogAlreadyExists(String),

    /// The pointer was never issued by this log, or was compacted away.
    #[error("pointer {0:?} does not match any retained log prefix")]
    UnknownPointer(ChainPointer),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
