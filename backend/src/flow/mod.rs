//! Request/callback orchestration
//!
//! Drives a verification session from issuance to its terminal state:
//!
//! 1. `issue` files a fresh authorization request under a new session and
//!    marks its request id pending.
//! 2. `handle_callback` claims the session, has the proof verified, checks
//!    the nullifier against the replay guard and only then marks success.
//! 3. `status` is a pure read for pollers.

mod error;

use std::sync::Arc;
use std::time::Duration;

use common_types::{
    AuthorizationRequest, AuthorizationRequestBody, AuthorizationResponse, RequestId, SessionId,
    StatusResponse, VerificationStatus, AUTHORIZATION_REQUEST_MESSAGE_TYPE,
    PLAIN_MESSAGE_MEDIA_TYPE,
};
use tracing::{error, info, warn};
use uuid::Uuid;
use verifier_storage::{
    ReplayDecision, ReplayGuard, Session, SessionOutcome, SessionStore, StatusStore,
};

pub use error::FlowError;

use crate::proof_verifier::{ProofVerifier, VerifyOptions};
use crate::verification_config::{NullifierSessionId, VerificationConfig};

/// Deployment parameters of the flow
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Active use case, with any issuer override applied
    pub config: VerificationConfig,
    /// Public base URL the wallet calls back on
    pub host_url: Option<String>,
    /// DID the authorization requests are sent from
    pub verifier_did: Option<String>,
    pub nullifier_session_id: NullifierSessionId,
    pub verify_options: VerifyOptions,
}

/// Protocol state machine shared by all handlers
pub struct VerificationFlow {
    settings: FlowSettings,
    sessions: Arc<dyn SessionStore>,
    statuses: Arc<dyn StatusStore>,
    replay_guard: Arc<dyn ReplayGuard>,
    verifier: Arc<dyn ProofVerifier>,
}

impl VerificationFlow {
    #[must_use]
    pub fn new(
        settings: FlowSettings,
        sessions: Arc<dyn SessionStore>,
        statuses: Arc<dyn StatusStore>,
        replay_guard: Arc<dyn ReplayGuard>,
        verifier: Arc<dyn ProofVerifier>,
    ) -> Self {
        Self {
            settings,
            sessions,
            statuses,
            replay_guard,
            verifier,
        }
    }

    /// The active verification configuration
    #[must_use]
    pub const fn config(&self) -> &VerificationConfig {
        &self.settings.config
    }

    /// Issues a new authorization request bound to a fresh session.
    ///
    /// # Errors
    ///
    /// `MissingHostUrl` / `MissingVerifierIdentity` on misconfiguration,
    /// storage errors otherwise.
    pub async fn issue(&self) -> Result<AuthorizationRequest, FlowError> {
        let host_url = self
            .settings
            .host_url
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or(FlowError::MissingHostUrl)?;
        let verifier_did = self
            .settings
            .verifier_did
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or(FlowError::MissingVerifierIdentity)?;

        let session_id = SessionId::new_v4();
        let request_id = RequestId::from(session_id);

        let proof_request = self
            .settings
            .config
            .proof_request(request_id, &self.settings.nullifier_session_id);

        let message_id = Uuid::new_v4().to_string();
        let request = AuthorizationRequest {
            id: message_id.clone(),
            thid: message_id,
            typ: PLAIN_MESSAGE_MEDIA_TYPE.to_string(),
            message_type: AUTHORIZATION_REQUEST_MESSAGE_TYPE.to_string(),
            from: verifier_did.to_string(),
            body: AuthorizationRequestBody {
                callback_url: format!(
                    "{}/api/callback?sessionId={session_id}",
                    host_url.trim_end_matches('/')
                ),
                reason: self.settings.config.description.clone(),
                scope: vec![proof_request],
            },
        };

        let session = Session::new(session_id, request.clone())?;
        self.sessions.create(session).await?;

        if let Err(e) = self.statuses.init_pending(request_id).await {
            // Without a status entry the session would be unobservable
            if let Err(cleanup) = self.sessions.delete(&session_id).await {
                error!(%session_id, "Failed to drop session after status error: {cleanup}");
            }
            return Err(e.into());
        }

        info!(%session_id, use_case = %self.settings.config.use_case, "Issued verification request");
        Ok(request)
    }

    /// Handles the wallet callback for a session.
    ///
    /// The session is claimed before verification starts, so each session
    /// accepts exactly one callback whatever its outcome. An empty body does
    /// not claim it.
    ///
    /// # Errors
    ///
    /// Protocol errors for malformed, unknown or reused sessions and missing
    /// or mismatched proofs, `AlreadyVerified` on replay and
    /// `VerificationService` when the proof verifier fails.
    pub async fn handle_callback(
        &self,
        session_id: Option<&str>,
        body: &[u8],
    ) -> Result<AuthorizationResponse, FlowError> {
        let session_id: SessionId = session_id
            .ok_or(FlowError::MalformedSessionId)?
            .parse()
            .map_err(|_| FlowError::MalformedSessionId)?;

        if self.sessions.get(&session_id).await?.is_none() {
            return Err(FlowError::UnknownOrExpiredSession);
        }

        let token = String::from_utf8_lossy(body);
        let token = token.trim();
        if token.is_empty() {
            return Err(FlowError::MissingProofToken);
        }

        let session = self.sessions.begin_callback(&session_id).await?;

        let result = self.verify_session(&session, token).await;

        let outcome = if result.is_ok() {
            SessionOutcome::Verified
        } else {
            SessionOutcome::Rejected
        };
        if let Err(e) = self.sessions.complete(&session_id, outcome).await {
            // Evicted mid-flight; the outcome is already decided
            warn!(%session_id, "Failed to record callback outcome: {e}");
        }

        result
    }

    async fn verify_session(
        &self,
        session: &Session,
        token: &str,
    ) -> Result<AuthorizationResponse, FlowError> {
        let response = self
            .verifier
            .verify(token, &session.request, &self.settings.verify_options)
            .await
            .map_err(FlowError::VerificationService)?;

        let proof = response
            .proof_for(&self.settings.config.circuit_id, session.request_id)
            .ok_or(FlowError::NoMatchingProof)?;

        let signals = self
            .verifier
            .public_signals(proof)
            .map_err(|e| FlowError::InvalidPublicSignals(e.to_string()))?;
        let nullifier = signals.nullifier.to_hex_string();
        let presenter = signals.user_id.to_hex_string();

        let decision = self
            .replay_guard
            .try_record_verification(&nullifier, session.session_id, &nullifier, &presenter)
            .await?;

        match decision {
            ReplayDecision::Accepted => {
                self.statuses.mark_success(session.request_id).await?;
                info!(
                    session_id = %session.session_id,
                    %nullifier,
                    %presenter,
                    "Proof verified"
                );
                Ok(response)
            }
            ReplayDecision::Rejected(reason) => {
                warn!(
                    session_id = %session.session_id,
                    %nullifier,
                    ?reason,
                    "Replayed nullifier rejected"
                );
                Err(FlowError::AlreadyVerified)
            }
        }
    }

    /// Resolves the status of a request id. Never fails: malformed ids and
    /// storage errors read as `not_found`.
    pub async fn status(&self, request_id: &str) -> StatusResponse {
        let status = match request_id.parse::<RequestId>() {
            Ok(id) => self.statuses.get(&id).await.unwrap_or_else(|e| {
                error!(%id, "Failed to read status: {e}");
                VerificationStatus::NotFound
            }),
            Err(_) => VerificationStatus::NotFound,
        };

        StatusResponse {
            request_id: request_id.to_string(),
            status,
        }
    }

    /// Evicts sessions and statuses older than `ttl`, returning how many
    /// entries were dropped.
    ///
    /// # Errors
    ///
    /// Storage errors.
    pub async fn purge_expired(&self, ttl: Duration) -> Result<usize, FlowError> {
        let sessions = self.sessions.purge_expired(ttl).await?;
        let statuses = self.statuses.purge_expired(ttl).await?;
        Ok(sessions + statuses)
    }
}
