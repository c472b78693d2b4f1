mod callback;
mod status;
mod verification_request;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};

/// Creates the verification API router
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/api/verification-request",
            get(verification_request::handler),
        )
        .api_route("/api/status/{id}", get(status::handler))
        .api_route("/api/callback", post(callback::handler))
}
