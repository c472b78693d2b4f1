//! Wire types shared between the verifier backend and its clients
//!
//! The authorization request/response shapes follow the iden3 comm protocol
//! as consumed by Privado/Billions wallets.

mod authorization;
mod ids;
mod status;

pub use authorization::{
    AuthorizationRequest, AuthorizationRequestBody, AuthorizationResponse,
    AuthorizationResponseBody, ProofQuery, ProofRequest, ProofRequestParams, ZkProofResponse,
    AUTHORIZATION_REQUEST_MESSAGE_TYPE, CREDENTIAL_ATOMIC_QUERY_V3, PLAIN_MESSAGE_MEDIA_TYPE,
};
pub use ids::{IdParseError, RequestId, SessionId};
pub use status::{StatusResponse, VerificationStatus};
