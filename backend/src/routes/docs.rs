use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi, scalar::Scalar};
use axum::{routing::get, Extension, Json};

/// Interactive API reference and the raw OpenAPI document
pub fn handler() -> ApiRouter {
    let scalar = Scalar::new("/openapi.json").with_title("SSI Verifier Backend Docs");

    ApiRouter::new()
        .route("/docs", scalar.axum_route())
        .route("/openapi.json", get(openapi_schema))
}

#[allow(clippy::unused_async)]
async fn openapi_schema(Extension(openapi): Extension<Arc<OpenApi>>) -> Json<OpenApi> {
    Json(openapi.as_ref().clone())
}
