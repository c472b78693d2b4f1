use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use aide::openapi::{Info, OpenApi};
use axum::{
    http::{header, HeaderValue, Method},
    middleware, Extension, Router,
};
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use crate::flow::VerificationFlow;
use crate::middleware::{rate_limit_middleware, RateLimiter};
use crate::routes;
use crate::types::{Environment, VerifierSettings};

/// Upper bound on a request, including the call to the proof verifier
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Longest pause between two expiry sweeps
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Scripts and styles from the CDN are needed by the docs page
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' https://cdn.jsdelivr.net; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data:; \
    object-src 'none'; \
    frame-ancestors 'self'";

/// CORS policy: any origin unless an allow-list is configured
#[must_use]
pub fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    match allowed_origins {
        Some(origins) => {
            let origins = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(%origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect::<Vec<_>>();
            cors.allow_origin(AllowOrigin::list(origins))
        }
        None => cors.allow_origin(Any),
    }
}

/// Builds the application router with its dependencies, the rate limit and
/// the security headers applied to every route
pub fn router(
    environment: Environment,
    flow: Arc<VerificationFlow>,
    rate_limiter: Arc<RateLimiter>,
    cors: CorsLayer,
) -> Router {
    let mut openapi = OpenApi {
        info: Info {
            title: "SSI Verifier Backend".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Info::default()
        },
        ..OpenApi::default()
    };

    routes::handler(environment)
        .finish_api(&mut openapi)
        .layer(Extension(Arc::new(openapi)))
        .layer(Extension(environment))
        .layer(Extension(flow))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(Extension(rate_limiter))
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
}

/// Periodically evicts expired sessions, statuses and rate limit windows
pub fn spawn_expiry_sweeper(
    flow: Arc<VerificationFlow>,
    rate_limiter: Arc<RateLimiter>,
    ttl: Duration,
) -> JoinHandle<()> {
    let period = ttl.min(MAX_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            match flow.purge_expired(ttl).await {
                Ok(0) => {}
                Ok(evicted) => tracing::debug!(evicted, "Evicted expired verification state"),
                Err(e) => tracing::error!("Failed to evict expired verification state: {e}"),
            }
            rate_limiter.purge_stale();
        }
    })
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    settings: &VerifierSettings,
    flow: Arc<VerificationFlow>,
) -> anyhow::Result<()> {
    let rate_limiter = Arc::new(RateLimiter::new(settings.rate_limit));
    let sweeper = spawn_expiry_sweeper(flow.clone(), rate_limiter.clone(), settings.session_ttl);

    let router = router(
        environment,
        flow,
        rate_limiter,
        cors_layer(settings.cors_allowed_origins.as_deref()),
    )
    // Include trace context as header into the response
    .layer(OtelInResponseLayer)
    // Start OpenTelemetry trace on incoming request
    .layer(OtelAxumLayer::default())
    .layer(tower_http::timeout::TimeoutLayer::new(REQUEST_TIMEOUT));

    let addr = SocketAddr::from(([0, 0, 0, 0], Environment::port()?));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("SSI Verifier Backend started on http://{addr}");

    let result = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(anyhow::Error::from);

    sweeper.abort();
    result
}
