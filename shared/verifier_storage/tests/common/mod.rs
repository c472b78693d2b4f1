// Not every helper is used in every test binary
#![allow(dead_code)]

use common_types::{
    AuthorizationRequest, AuthorizationRequestBody, ProofQuery, ProofRequest, ProofRequestParams,
    RequestId, SessionId, AUTHORIZATION_REQUEST_MESSAGE_TYPE, CREDENTIAL_ATOMIC_QUERY_V3,
    PLAIN_MESSAGE_MEDIA_TYPE,
};
use verifier_storage::Session;

/// Builds an authorization request whose single scope entry carries `request_id`
pub fn authorization_request(session_id: SessionId, request_id: RequestId) -> AuthorizationRequest {
    AuthorizationRequest {
        id: session_id.to_string(),
        thid: session_id.to_string(),
        typ: PLAIN_MESSAGE_MEDIA_TYPE.to_string(),
        message_type: AUTHORIZATION_REQUEST_MESSAGE_TYPE.to_string(),
        from: "did:iden3:privado:main:verifier".to_string(),
        body: AuthorizationRequestBody {
            callback_url: format!("http://localhost:8080/api/callback?sessionId={session_id}"),
            reason: "Verify you are a unique human".to_string(),
            scope: vec![ProofRequest {
                circuit_id: CREDENTIAL_ATOMIC_QUERY_V3.to_string(),
                id: request_id,
                params: ProofRequestParams {
                    nullifier_session_id: "8472917364519283".to_string(),
                },
                query: ProofQuery {
                    allowed_issuers: vec![
                        "did:iden3:billions:main:2VmnvBNtpxCUbiEH3R2DNuXqPxuaBQJsG6mwU1J8PD"
                            .to_string(),
                    ],
                    context: "ipfs://QmcUEDa42Er4nfNFmGQVjiNYFaik6kvNQjfTeBrdSx83At".to_string(),
                    credential_type: "UniquenessCredential".to_string(),
                },
            }],
        },
    }
}

/// A freshly issued session with a consistent request id
pub fn issued_session() -> Session {
    let session_id = SessionId::new_v4();
    Session::new(
        session_id,
        authorization_request(session_id, session_id.into()),
    )
    .expect("request id matches session id")
}
