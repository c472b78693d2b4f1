//! Error types for replay guard operations

use thiserror::Error;

/// Result type for replay guard operations
pub type ReplayGuardResult<T> = Result<T, ReplayGuardError>;

/// Errors that can occur during replay guard operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReplayGuardError {
    /// Refusing to record a verification without a key
    #[error("Replay guard key must not be empty")]
    EmptyKey,

    /// Backing store failure
    #[error("Replay guard backend error: {0}")]
    Backend(String),
}
