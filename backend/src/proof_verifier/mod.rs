//! Proof verification service boundary.
//!
//! Zero-knowledge verification (circuit keys, on-chain issuer state, IPFS
//! schemas) is not done in this service. It is delegated to a proof verifier
//! that takes the raw wallet token plus the authorization request it answers
//! and returns the verified authorization response.
//!
//! # Components
//! - `error`: error types for verification failures
//! - `remote`: production verifier reached over HTTP
//! - `signals`: decoding of circuit public signals
//! - `stub`: scripted verifier for tests (`test-utils` feature)

pub mod error;
pub mod remote;
pub mod signals;
#[cfg(any(test, feature = "test-utils"))]
pub mod stub;

use std::time::Duration;

use async_trait::async_trait;
use common_types::{AuthorizationRequest, AuthorizationResponse, ZkProofResponse};
use serde::Serialize;

pub use error::ProofVerifierError;
pub use remote::RemoteProofVerifier;
pub use signals::{FieldElement, PublicSignals};

/// How far the issuer's on-chain state may lag behind the state a proof was
/// generated against
pub const ACCEPTED_STATE_TRANSITION_DELAY: Duration = Duration::from_secs(5 * 60);

/// Options forwarded with every verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    pub accepted_state_transition_delay: Duration,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            accepted_state_transition_delay: ACCEPTED_STATE_TRANSITION_DELAY,
        }
    }
}

/// On-chain state contract for one network namespace (e.g. `billions:main`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResolver {
    pub rpc_url: String,
    pub contract_address: String,
}

/// Trait for the proof verification service
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Fully verifies a wallet token against the request it answers.
    ///
    /// # Errors
    ///
    /// Any cryptographic, on-chain state or transport failure. Callers must
    /// treat every error as fatal for the attempt.
    async fn verify(
        &self,
        token: &str,
        request: &AuthorizationRequest,
        options: &VerifyOptions,
    ) -> Result<AuthorizationResponse, ProofVerifierError>;

    /// Decodes the public signals of a verified proof.
    ///
    /// # Errors
    ///
    /// `InvalidPublicSignals` if the signals do not follow the circuit layout.
    fn public_signals(&self, proof: &ZkProofResponse) -> Result<PublicSignals, ProofVerifierError> {
        PublicSignals::from_atomic_query_v3(&proof.pub_signals)
    }
}
