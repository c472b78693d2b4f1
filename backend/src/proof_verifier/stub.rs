use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use common_types::{
    AuthorizationRequest, AuthorizationResponse, AuthorizationResponseBody, RequestId,
    ZkProofResponse,
};
use serde_json::json;
use uuid::Uuid;

use super::{ProofVerifier, ProofVerifierError, VerifyOptions};

/// DID reported as presenter by [`StubProofVerifier`]
pub const STUB_PRESENTER_DID: &str =
    "did:iden3:billions:main:2VmAk7fGHQP5FN2jZ8X9Y3K4L6M1N8P2Q5R7S9T3U";

/// Holder identity (`userID` signal) carried by every stub proof
pub const STUB_USER_ID: &str =
    "23148936466334350744548790012294489365207440754509988986684797708370051073";

/// How the stub answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubBehavior {
    /// Every proof carries this nullifier
    FixedNullifier(String),
    /// The token itself is the nullifier
    NullifierFromToken,
    /// Verification fails as if the verifier rejected the proof
    Fail,
    /// The proof answers a request id other than the one issued
    ForeignRequestId,
    /// The proof is for a circuit other than the one requested
    ForeignCircuit,
}

/// Scripted proof verifier for tests
///
/// Builds a response answering every scope entry of the request, with the
/// nullifier placed where AtomicQueryV3 puts it.
#[derive(Debug)]
pub struct StubProofVerifier {
    behavior: StubBehavior,
    calls: AtomicUsize,
    last_options: Mutex<Option<VerifyOptions>>,
}

impl StubProofVerifier {
    #[must_use]
    pub const fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// Number of `verify` calls so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent `verify` call
    ///
    /// # Panics
    ///
    /// If the mutex is poisoned
    #[must_use]
    pub fn last_options(&self) -> Option<VerifyOptions> {
        *self.last_options.lock().expect("stub mutex poisoned")
    }
}

fn pub_signals(nullifier: &str) -> Vec<String> {
    vec![
        STUB_USER_ID.to_string(),
        "1".to_string(),
        "7343124515412519209290431587617584127394757837545209617287932498224474937".to_string(),
        "0".to_string(),
        nullifier.to_string(),
        "0".to_string(),
        "1".to_string(),
        "1".to_string(),
    ]
}

#[async_trait]
impl ProofVerifier for StubProofVerifier {
    async fn verify(
        &self,
        token: &str,
        request: &AuthorizationRequest,
        options: &VerifyOptions,
    ) -> Result<AuthorizationResponse, ProofVerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().expect("stub mutex poisoned") = Some(*options);

        let nullifier = match &self.behavior {
            StubBehavior::Fail => {
                return Err(ProofVerifierError::VerificationFailed(
                    "proof is not valid".to_string(),
                ))
            }
            StubBehavior::NullifierFromToken => token.to_string(),
            StubBehavior::FixedNullifier(nullifier) => nullifier.clone(),
            StubBehavior::ForeignRequestId | StubBehavior::ForeignCircuit => "0x1".to_string(),
        };

        let scope = request
            .body
            .scope
            .iter()
            .map(|entry| ZkProofResponse {
                id: match self.behavior {
                    StubBehavior::ForeignRequestId => RequestId::from(Uuid::new_v4()),
                    _ => entry.id,
                },
                circuit_id: match self.behavior {
                    StubBehavior::ForeignCircuit => "credentialAtomicQuerySigV2".to_string(),
                    _ => entry.circuit_id.clone(),
                },
                proof: json!({ "protocol": "groth16", "curve": "bn128" }),
                pub_signals: pub_signals(&nullifier),
                vp: None,
            })
            .collect();

        Ok(AuthorizationResponse {
            id: Uuid::new_v4().to_string(),
            thid: Some(request.thid.clone()),
            typ: Some(request.typ.clone()),
            message_type: Some("https://iden3-communication.io/authorization/1.0/response".to_string()),
            from: STUB_PRESENTER_DID.to_string(),
            to: Some(request.from.clone()),
            body: AuthorizationResponseBody {
                message: None,
                scope,
            },
        })
    }
}
