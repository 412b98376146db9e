//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from repositories, the ledger, the proving backend and
//! worker coordination so callers can decide uniformly whether to retry.
use thiserror::Error;

use rollup_core::ChainPointer;
use zk::{ProofError, PublicKey};

pub use crate::repository::RepositoryError;
use crate::ledger::StateField;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The caller's checkpoint is no longer the committed one.
    #[error("stale checkpoint at {expected:?}; committed pointer is {committed:?}")]
    StaleCheckpoint {
        expected: ChainPointer,
        committed: ChainPointer,
    },

    #[error("pointer {0:?} matches no retained log prefix")]
    UnknownPointer(ChainPointer),

    #[error("precondition on {field} no longer holds")]
    PreconditionFailed { field: StateField },

    #[error("state field {0} is not set")]
    MissingField(StateField),

    #[error("state field {field} holds a {found} value")]
    FieldTypeMismatch {
        field: StateField,
        found: &'static str,
    },

    #[error("proof failed verification: {0}")]
    ProofVerification(String),

    #[error("signature does not verify for the caller")]
    SignatureMismatch,

    #[error("caller {caller:?} may not act for {expected:?}")]
    UnauthorizedTransition {
        caller: PublicKey,
        expected: PublicKey,
    },

    #[error("proof artifact was already consumed")]
    ArtifactReplayed,

    #[error("{sender:?} is not the deployer")]
    NotDeployer { sender: PublicKey },

    #[error("contract is already initialized")]
    AlreadyInitialized,

    #[error("secret commitment does not match")]
    SecretMismatch,

    #[error("{owner:?} holds {balance}, cannot debit {requested}")]
    InsufficientBalance {
        owner: PublicKey,
        balance: u64,
        requested: u64,
    },

    #[error("balance of {owner:?} would overflow")]
    BalanceOverflow { owner: PublicKey },

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error("proof worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl From<RepositoryError> for RuntimeError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::UnknownPointer(pointer) => Self::UnknownPointer(pointer),
            other => Self::Repository(other),
        }
    }
}

impl RuntimeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::StaleCheckpoint { .. } | Self::PreconditionFailed { .. } => {
                ErrorSeverity::Recoverable
            }

            Self::MissingField(_)
            | Self::NotDeployer { .. }
            | Self::AlreadyInitialized
            | Self::SecretMismatch
            | Self::ArtifactReplayed
            | Self::InsufficientBalance { .. }
            | Self::BalanceOverflow { .. }
            | Self::Proof(_) => ErrorSeverity::Validation,

            Self::FieldTypeMismatch { .. } | Self::WorkerJoin(_) => ErrorSeverity::Internal,

            Self::UnknownPointer(_)
            | Self::ProofVerification(_)
            | Self::SignatureMismatch
            | Self::UnauthorizedTransition { .. }
            | Self::Repository(_) => ErrorSeverity::Fatal,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }
}

/// How a caller should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Lost an optimistic race; retry with fresh state.
    Recoverable,

    /// Request rejected; retrying unchanged fails again.
    Validation,

    /// Unexpected inconsistency. Indicates a bug.
    Internal,

    /// The operation cannot succeed against this log or proof.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}
