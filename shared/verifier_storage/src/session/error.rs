//! Error types for session storage operations

use common_types::{RequestId, SessionId};
use thiserror::Error;

use super::SessionState;

/// Result type for session storage operations
pub type SessionStoreResult<T> = Result<T, SessionStoreError>;

/// Errors that can occur during session storage operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionStoreError {
    /// A session with this id is already outstanding
    #[error("Session {0} already exists")]
    DuplicateSession(SessionId),

    /// No session stored under this id (never issued or evicted)
    #[error("Session {0} not found")]
    NotFound(SessionId),

    /// The session already received its callback
    #[error("Session {session_id} is already {state}")]
    AlreadyUsed {
        /// Session that was reused
        session_id: SessionId,
        /// State the session is in
        state: SessionState,
    },

    /// Requested state change is not allowed from the current state
    #[error("Session {session_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Session being updated
        session_id: SessionId,
        /// Current state
        from: SessionState,
        /// Requested state
        to: SessionState,
    },

    /// A scope entry carries a request id other than the session's
    #[error("Proof request {request_id} does not belong to session {session_id}")]
    RequestIdMismatch {
        /// Session the request was filed under
        session_id: SessionId,
        /// Offending scope entry id
        request_id: RequestId,
    },

    /// Backing store failure
    #[error("Session backend error: {0}")]
    Backend(String),
}
