//! Types downstream callers interact with.

mod errors;

pub use errors::{ErrorSeverity, RepositoryError, Result, RuntimeError};
