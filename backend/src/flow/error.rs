use thiserror::Error;
use verifier_storage::{ReplayGuardError, SessionStoreError, StatusStoreError};

use crate::proof_verifier::ProofVerifierError;

/// Errors of the issuance and callback protocol
#[derive(Debug, Error)]
pub enum FlowError {
    /// `HOST_URL` is not configured, no callback URL can be built
    #[error("Host URL is not configured")]
    MissingHostUrl,

    /// `VERIFIER_DID` is not configured
    #[error("Verifier identity is not configured")]
    MissingVerifierIdentity,

    #[error("Session id is missing or malformed")]
    MalformedSessionId,

    /// Never issued, or evicted after its TTL
    #[error("Unknown or expired session")]
    UnknownOrExpiredSession,

    /// The session already received a callback
    #[error("Session was already used")]
    SessionAlreadyUsed,

    #[error("Proof token is missing")]
    MissingProofToken,

    /// The verified response holds no proof for the issued request
    #[error("No proof matches the issued request")]
    NoMatchingProof,

    #[error("Invalid public signals: {0}")]
    InvalidPublicSignals(String),

    /// The nullifier was verified before
    #[error("Credential was already verified")]
    AlreadyVerified,

    /// The proof verifier refused the proof or could not be reached
    #[error("Verification service error: {0}")]
    VerificationService(#[source] ProofVerifierError),

    /// Freshly generated session id collided with an outstanding one
    #[error("Session id collision")]
    DuplicateSession,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<SessionStoreError> for FlowError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::DuplicateSession(_) => Self::DuplicateSession,
            SessionStoreError::NotFound(_) => Self::UnknownOrExpiredSession,
            SessionStoreError::AlreadyUsed { .. } => Self::SessionAlreadyUsed,
            SessionStoreError::InvalidTransition { .. }
            | SessionStoreError::RequestIdMismatch { .. }
            | SessionStoreError::Backend(_) => Self::Storage(err.to_string()),
        }
    }
}

impl From<StatusStoreError> for FlowError {
    fn from(err: StatusStoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<ReplayGuardError> for FlowError {
    fn from(err: ReplayGuardError) -> Self {
        Self::Storage(err.to_string())
    }
}
