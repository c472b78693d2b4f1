mod api;
mod docs;
mod health;

use aide::axum::{routing::get, ApiRouter};

use crate::types::Environment;

/// Creates the router with all handler routes. API docs are only mounted
/// where the environment allows them.
pub fn handler(environment: Environment) -> ApiRouter {
    let router = ApiRouter::new()
        .api_route("/health", get(health::handler))
        .merge(api::handler());

    if environment.show_api_docs() {
        router.merge(docs::handler())
    } else {
        router
    }
}
