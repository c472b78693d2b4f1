use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::RequestId;

/// iden3 comm message type of an authorization request
pub const AUTHORIZATION_REQUEST_MESSAGE_TYPE: &str =
    "https://iden3-communication.io/authorization/1.0/request";

/// iden3 comm media type for unsigned, unencrypted messages
pub const PLAIN_MESSAGE_MEDIA_TYPE: &str = "application/iden3comm-plain-json";

/// Circuit carrying the nullifier used for replay protection
pub const CREDENTIAL_ATOMIC_QUERY_V3: &str = "credentialAtomicQueryV3-beta.1";

/// Credential query template sent to the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProofQuery {
    /// Issuer DIDs whose credentials are accepted, in preference order
    pub allowed_issuers: Vec<String>,
    /// JSON-LD context of the credential schema
    pub context: String,
    /// Credential type tag
    #[serde(rename = "type")]
    pub credential_type: String,
}

/// Per-request proof parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequestParams {
    /// Stringified positive integer binding the nullifier to this verifier
    pub nullifier_session_id: String,
}

/// A single zero-knowledge proof request in an authorization request scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    /// Circuit the wallet must prove against
    pub circuit_id: String,
    /// Request id, equal to the session id it was issued under
    pub id: RequestId,
    pub params: ProofRequestParams,
    pub query: ProofQuery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequestBody {
    /// Where the wallet posts its proof token, including the session id
    pub callback_url: String,
    /// Human readable purpose shown in the wallet
    pub reason: String,
    pub scope: Vec<ProofRequest>,
}

/// Challenge handed to the wallet, usually encoded into a QR code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuthorizationRequest {
    pub id: String,
    pub thid: String,
    /// Media type of the message
    pub typ: String,
    /// Protocol message type
    #[serde(rename = "type")]
    pub message_type: String,
    /// Verifier DID
    pub from: String,
    pub body: AuthorizationRequestBody,
}

/// Proof produced by the wallet for one scope entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZkProofResponse {
    pub id: RequestId,
    pub circuit_id: String,
    /// Groth16 proof, opaque to this service
    pub proof: serde_json::Value,
    /// Public signals as decimal strings, in circuit order
    #[serde(rename = "pub_signals")]
    pub pub_signals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vp: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuthorizationResponseBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub scope: Vec<ZkProofResponse>,
}

/// Verified authorization response, as returned by the proof verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuthorizationResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    /// DID of the presenting holder
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub body: AuthorizationResponseBody,
}

impl AuthorizationResponse {
    /// Finds the proof for `circuit_id` answering the given request id.
    ///
    /// Both must match: a proof for the right circuit issued under another
    /// session is not accepted.
    #[must_use]
    pub fn proof_for(&self, circuit_id: &str, request_id: RequestId) -> Option<&ZkProofResponse> {
        self.body
            .scope
            .iter()
            .find(|s| s.circuit_id == circuit_id && s.id == request_id)
    }
}
