use aide::axum::IntoApiResponse;
use axum::Json;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct HealthResponse {
    status: &'static str,
    /// Crate version of the running service
    semver: &'static str,
    /// Commit the binary was built from, when known
    rev: Option<&'static str>,
}

/// Health check endpoint
///
/// Liveness probe reporting the running version.
pub async fn handler() -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "ok",
        semver: env!("CARGO_PKG_VERSION"),
        rev: option_env!("GIT_REV"),
    })
}
