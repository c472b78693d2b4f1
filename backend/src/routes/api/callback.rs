use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query},
    Extension, Json,
};
use common_types::AuthorizationResponse;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::instrument;

use crate::flow::VerificationFlow;
use crate::types::{AppError, ProofToken};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallbackQuery {
    /// Session the wallet is answering, as embedded in the callback URL
    session_id: Option<String>,
}

/// Wallet callback
///
/// Receives the proof token for a session, has it verified and records the
/// verification. Each session accepts a single callback.
///
/// # Errors
///
/// 400 for malformed, unknown or reused sessions, missing or mismatched
/// proofs and replayed credentials. A query string that does not parse
/// counts as a malformed session id. 500 if the proof verifier fails.
#[instrument(skip(flow, token))]
pub async fn handler(
    Extension(flow): Extension<Arc<VerificationFlow>>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
    ProofToken(token): ProofToken,
) -> Result<Json<AuthorizationResponse>, AppError> {
    let session_id = match query {
        Ok(Query(query)) => query.session_id,
        Err(rejection) => {
            tracing::debug!("Unparseable callback query: {rejection}");
            None
        }
    };

    let response = flow.handle_callback(session_id.as_deref(), &token).await?;

    Ok(Json(response))
}
