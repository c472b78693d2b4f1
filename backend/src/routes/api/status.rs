use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use common_types::StatusResponse;
use tracing::instrument;

use crate::flow::VerificationFlow;

/// Poll the status of a verification request
///
/// Always answers 200. Ids that were never issued, have expired or are not
/// well formed report `not_found`.
#[instrument(skip(flow))]
pub async fn handler(
    Extension(flow): Extension<Arc<VerificationFlow>>,
    Path(id): Path<String>,
) -> Json<StatusResponse> {
    Json(flow.status(&id).await)
}
