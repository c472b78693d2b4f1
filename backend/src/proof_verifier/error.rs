use thiserror::Error;

/// Error types for proof verification
#[derive(Debug, Error)]
pub enum ProofVerifierError {
    /// The verifier rejected the token (bad proof, unknown issuer state,
    /// stale on-chain state, request mismatch)
    #[error("Proof verification failed: {0}")]
    VerificationFailed(String),

    /// Public signals could not be decoded or carry no nullifier
    #[error("Invalid public signals: {0}")]
    InvalidPublicSignals(String),

    /// The verification request could not be encoded
    #[error("Failed to serialize verification request: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Network error when communicating with the verifier
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest_middleware::Error),

    /// The verifier answered with a body we could not decode
    #[error("Invalid verifier response: {0}")]
    InvalidResponseBody(#[from] reqwest::Error),

    /// Unexpected status from the verifier
    #[error("Verifier error: {0}")]
    InvalidVerifierResponse(String),
}
