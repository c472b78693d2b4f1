use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Externally visible verification status of a proof request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
    /// Request issued, no accepted proof yet
    Pending,
    /// A proof was verified and passed the replay guard
    Success,
    /// Nothing is stored for the id. Never issued, or already evicted;
    /// pollers should treat it as possibly transient.
    NotFound,
}

/// Response of the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// The request id that was queried, echoed back verbatim
    pub request_id: String,
    /// Resolved status
    pub status: VerificationStatus,
}
