use std::str::FromStr;
use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use backend::{
    flow::{FlowSettings, VerificationFlow},
    middleware::{RateLimitConfig, RateLimiter},
    proof_verifier::{
        stub::{StubBehavior, StubProofVerifier},
        VerifyOptions,
    },
    server,
    types::Environment,
    verification_config::{resolve_config, NullifierSessionId},
};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use verifier_storage::{InMemoryReplayGuard, InMemorySessionStore, InMemoryStatusStore};

pub const HOST_URL: &str = "https://verifier.example";
pub const VERIFIER_DID: &str = "did:iden3:billions:main:2VmAkXrihYaL4HiP9Wh3cBBHAAo8yVDSZhoMfQzLuQ";

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Flow settings for the POU use case with a fixed nullifier session id
pub fn flow_settings() -> FlowSettings {
    FlowSettings {
        config: resolve_config("POU").expect("POU is registered"),
        host_url: Some(HOST_URL.to_string()),
        verifier_did: Some(VERIFIER_DID.to_string()),
        nullifier_session_id: NullifierSessionId::from_str("8472917364519283")
            .expect("valid nullifier session id"),
        verify_options: VerifyOptions::default(),
    }
}

/// Router wired to in-memory stores and a scripted proof verifier
pub struct TestSetup {
    pub router: Router,
    pub verifier: Arc<StubProofVerifier>,
    pub replay_guard: Arc<InMemoryReplayGuard>,
}

impl TestSetup {
    pub fn new(behavior: StubBehavior) -> Self {
        Self::with_config(behavior, flow_settings(), RateLimitConfig::default())
    }

    pub fn with_config(
        behavior: StubBehavior,
        settings: FlowSettings,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self::build(behavior, settings, rate_limit, server::cors_layer(None))
    }

    /// Router that only allows the given CORS origins
    pub fn with_allowed_origins(origins: &[&str]) -> Self {
        let origins = origins.iter().map(ToString::to_string).collect::<Vec<_>>();
        Self::build(
            StubBehavior::NullifierFromToken,
            flow_settings(),
            RateLimitConfig::default(),
            server::cors_layer(Some(&origins)),
        )
    }

    fn build(
        behavior: StubBehavior,
        settings: FlowSettings,
        rate_limit: RateLimitConfig,
        cors: CorsLayer,
    ) -> Self {
        setup_test_env();

        let verifier = Arc::new(StubProofVerifier::new(behavior));
        let replay_guard = Arc::new(InMemoryReplayGuard::new());

        let flow = Arc::new(VerificationFlow::new(
            settings,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryStatusStore::new()),
            replay_guard.clone(),
            verifier.clone(),
        ));

        let router = server::router(
            Environment::Development,
            flow,
            Arc::new(RateLimiter::new(rate_limit)),
            cors,
        );

        Self {
            router,
            verifier,
            replay_guard,
        }
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    /// GET request carrying an `Origin` header
    pub async fn send_get_request_from(
        &self,
        route: &str,
        origin: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .header("Origin", origin)
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    /// Posts a raw proof token to the callback endpoint
    pub async fn send_callback(
        &self,
        session_id: &str,
        token: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(format!("/api/callback?sessionId={session_id}"))
            .method("POST")
            .header("Content-Type", "text/plain")
            .body(Body::from(token.to_string()))?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn parse_response_body(
        &self,
        response: Response,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
        use http_body_util::BodyExt;

        let body = response.into_body().collect().await?.to_bytes();
        let json = serde_json::from_slice(&body)?;
        Ok(json)
    }

    /// Issues a verification request, returning it with its session id
    pub async fn issue(&self) -> (serde_json::Value, String) {
        let response = self
            .send_get_request("/api/verification-request")
            .await
            .expect("issuance request");
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let request = self
            .parse_response_body(response)
            .await
            .expect("authorization request body");
        let session_id = request["body"]["scope"][0]["id"]
            .as_str()
            .expect("scope entry id")
            .to_string();

        (request, session_id)
    }

    /// Status reported for a request id
    pub async fn status_of(&self, request_id: &str) -> String {
        let response = self
            .send_get_request(&format!("/api/status/{request_id}"))
            .await
            .expect("status request");
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = self.parse_response_body(response).await.expect("status body");
        assert_eq!(body["requestId"], request_id);
        body["status"].as_str().expect("status").to_string()
    }
}
