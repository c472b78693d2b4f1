//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::flow::FlowError;

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(
        status: StatusCode,
        code: &'static str,
        msg: impl Into<String>,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody {
                    code,
                    message: msg.into(),
                },
            },
        }
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert protocol errors to application errors
impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        use FlowError::{
            AlreadyVerified, DuplicateSession, InvalidPublicSignals, MalformedSessionId,
            MissingHostUrl, MissingProofToken, MissingVerifierIdentity, NoMatchingProof,
            SessionAlreadyUsed, Storage, UnknownOrExpiredSession, VerificationService,
        };

        match err {
            MissingHostUrl => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "missing_host_url",
                "Server is missing its public host URL",
                false,
            ),
            MissingVerifierIdentity => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "missing_verifier_identity",
                "Server is missing its verifier identity",
                false,
            ),
            MalformedSessionId => Self::new(
                StatusCode::BAD_REQUEST,
                "malformed_session_id",
                "Session id is missing or malformed",
                false,
            ),
            UnknownOrExpiredSession => Self::new(
                StatusCode::BAD_REQUEST,
                "unknown_session",
                "Unknown or expired session",
                false,
            ),
            SessionAlreadyUsed => Self::new(
                StatusCode::BAD_REQUEST,
                "session_already_used",
                "Session was already used",
                false,
            ),
            MissingProofToken => Self::new(
                StatusCode::BAD_REQUEST,
                "missing_proof_token",
                "Proof token is missing",
                false,
            ),
            NoMatchingProof => Self::new(
                StatusCode::BAD_REQUEST,
                "no_matching_proof",
                "No proof matches the issued request",
                false,
            ),
            InvalidPublicSignals(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_public_signals", msg, false)
            }
            AlreadyVerified => Self::new(
                StatusCode::BAD_REQUEST,
                "already_verified",
                "Credential was already verified",
                false,
            ),
            VerificationService(e) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "verification_failed",
                e.to_string(),
                true,
            ),
            DuplicateSession => {
                tracing::error!("Generated session id collided with an outstanding session");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    true,
                )
            }
            Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    true,
                )
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
