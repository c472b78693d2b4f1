use std::sync::Arc;

use axum::{Extension, Json};
use common_types::AuthorizationRequest;
use tracing::instrument;

use crate::flow::VerificationFlow;
use crate::types::AppError;

/// Issue a verification request
///
/// Opens a new session and returns the authorization request to hand to the
/// wallet, usually as a QR code. Its callback URL carries the session id.
///
/// # Errors
///
/// 500 if the host URL or verifier identity is not configured.
#[instrument(skip(flow))]
pub async fn handler(
    Extension(flow): Extension<Arc<VerificationFlow>>,
) -> Result<Json<AuthorizationRequest>, AppError> {
    Ok(Json(flow.issue().await?))
}
