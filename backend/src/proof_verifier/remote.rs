use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use common_types::{AuthorizationRequest, AuthorizationResponse};
use reqwest::{header, Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::Serialize;

use super::{ProofVerifier, ProofVerifierError, StateResolver, VerifyOptions};

/// Default timeout for proof verifier requests. Verification resolves issuer
/// state over RPC and fetches schemas from IPFS, so it is slow.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Everything the verifier needs besides the token and request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierContext {
    /// State contract per network namespace
    pub state_resolvers: BTreeMap<String, StateResolver>,
    /// Directory holding circuit verification keys
    pub circuits_dir: String,
    pub ipfs_gateway_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    token: &'a str,
    request: &'a AuthorizationRequest,
    accepted_state_transition_delay_ms: u64,
    state_resolvers: &'a BTreeMap<String, StateResolver>,
    circuits_dir: &'a str,
    ipfs_gateway_url: &'a str,
}

/// HTTP client to the proof verification service
pub struct RemoteProofVerifier {
    verify_url: String,
    context: VerifierContext,
    http_client: ClientWithMiddleware,
}

impl RemoteProofVerifier {
    /// Creates a new proof verifier client
    ///
    /// # Panics
    ///
    /// If the HTTP client fails to be created
    #[must_use]
    pub fn new(verifier_url: &str, context: VerifierContext) -> Self {
        let reqwest_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .user_agent(format!("ssi-verifier-backend/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Self {
            verify_url: format!("{}/verify", verifier_url.trim_end_matches('/')),
            context,
            http_client,
        }
    }
}

#[async_trait]
impl ProofVerifier for RemoteProofVerifier {
    async fn verify(
        &self,
        token: &str,
        request: &AuthorizationRequest,
        options: &VerifyOptions,
    ) -> Result<AuthorizationResponse, ProofVerifierError> {
        let body = VerifyRequest {
            token,
            request,
            accepted_state_transition_delay_ms: u64::try_from(
                options.accepted_state_transition_delay.as_millis(),
            )
            .unwrap_or(u64::MAX),
            state_resolvers: &self.context.state_resolvers,
            circuits_dir: &self.context.circuits_dir,
            ipfs_gateway_url: &self.context.ipfs_gateway_url,
        };

        let json_body = serde_json::to_string(&body)?;

        let response = self
            .http_client
            .post(&self.verify_url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(json_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(handle_verifier_error(&error_text, status));
        }

        Ok(response.json::<AuthorizationResponse>().await?)
    }
}

/// Client errors mean the token itself was refused; anything else is a
/// verifier malfunction.
fn handle_verifier_error(error_text: &str, status: StatusCode) -> ProofVerifierError {
    if status.is_client_error() {
        ProofVerifierError::VerificationFailed(error_text.to_string())
    } else {
        ProofVerifierError::InvalidVerifierResponse(format!("Status {status}: {error_text}"))
    }
}
