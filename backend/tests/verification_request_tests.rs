mod common;

use axum::http::StatusCode;
use backend::{middleware::RateLimitConfig, proof_verifier::stub::StubBehavior};
use common::*;

#[tokio::test]
async fn test_issues_authorization_request() {
    let setup = TestSetup::new(StubBehavior::NullifierFromToken);
    let (request, session_id) = setup.issue().await;

    assert_eq!(
        request["body"]["callbackUrl"],
        format!("{HOST_URL}/api/callback?sessionId={session_id}")
    );
    assert_eq!(request["body"]["reason"], "Verify you are a unique human");
    assert_eq!(request["from"], VERIFIER_DID);
    assert_eq!(request["typ"], "application/iden3comm-plain-json");
    assert_eq!(
        request["type"],
        "https://iden3-communication.io/authorization/1.0/request"
    );

    let scope = &request["body"]["scope"][0];
    assert_eq!(scope["circuitId"], "credentialAtomicQueryV3-beta.1");
    assert_eq!(scope["params"]["nullifierSessionId"], "8472917364519283");
    assert_eq!(scope["query"]["type"], "UniquenessCredential");
    assert_eq!(
        scope["query"]["context"],
        "ipfs://QmcUEDa42Er4nfNFmGQVjiNYFaik6kvNQjfTeBrdSx83At"
    );
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let setup = TestSetup::new(StubBehavior::NullifierFromToken);
    let (first_request, first) = setup.issue().await;
    let (second_request, second) = setup.issue().await;

    assert_ne!(first, second);
    assert_ne!(first_request["id"], second_request["id"]);
    assert_eq!(setup.status_of(&first).await, "pending");
    assert_eq!(setup.status_of(&second).await, "pending");

    // Verifying one session leaves the other untouched
    let response = setup.send_callback(&first, "0x1").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(setup.status_of(&first).await, "success");
    assert_eq!(setup.status_of(&second).await, "pending");
}

#[tokio::test]
async fn test_missing_host_url_is_a_server_error() {
    let mut settings = flow_settings();
    settings.host_url = None;
    let setup = TestSetup::with_config(
        StubBehavior::NullifierFromToken,
        settings,
        RateLimitConfig::default(),
    );

    let response = setup
        .send_get_request("/api/verification-request")
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = setup.parse_response_body(response).await.unwrap();
    assert_eq!(body["error"]["code"], "missing_host_url");
    assert_eq!(body["allowRetry"], false);
}

#[tokio::test]
async fn test_missing_verifier_identity_is_a_server_error() {
    let mut settings = flow_settings();
    settings.verifier_did = None;
    let setup = TestSetup::with_config(
        StubBehavior::NullifierFromToken,
        settings,
        RateLimitConfig::default(),
    );

    let response = setup
        .send_get_request("/api/verification-request")
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = setup.parse_response_body(response).await.unwrap();
    assert_eq!(body["error"]["code"], "missing_verifier_identity");
}

#[tokio::test]
async fn test_allowed_issuer_override_reaches_request() {
    let mut settings = flow_settings();
    settings.config = settings
        .config
        .with_allowed_issuers(vec!["did:iden3:privado:main:issuer".to_string()]);
    let setup = TestSetup::with_config(
        StubBehavior::NullifierFromToken,
        settings,
        RateLimitConfig::default(),
    );

    let (request, _) = setup.issue().await;
    assert_eq!(
        request["body"]["scope"][0]["query"]["allowedIssuers"],
        serde_json::json!(["did:iden3:privado:main:issuer"])
    );
}
