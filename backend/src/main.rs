use std::sync::Arc;

use backend::{
    flow::VerificationFlow, proof_verifier::RemoteProofVerifier, server, types::Environment,
};
use tracing_subscriber::{fmt, EnvFilter};
use verifier_storage::{InMemoryReplayGuard, InMemorySessionStore, InMemoryStatusStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Use JSON format for staging/production (Datadog), regular format for development
    if environment.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    let settings = environment.verifier_settings()?;
    let flow_settings = settings.flow_settings()?;

    tracing::info!(
        use_case = %flow_settings.config.use_case,
        name = %flow_settings.config.name,
        circuit = %flow_settings.config.circuit_id,
        "Serving verification use case"
    );
    if settings.host_url.is_none() || settings.verifier_did.is_none() {
        tracing::warn!("HOST_URL or VERIFIER_DID is not set, verification requests will fail");
    }

    let verifier = Arc::new(RemoteProofVerifier::new(
        &settings.proof_verifier_url,
        settings.verifier_context.clone(),
    ));

    let flow = Arc::new(VerificationFlow::new(
        flow_settings,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(InMemoryStatusStore::new()),
        Arc::new(InMemoryReplayGuard::new()),
        verifier,
    ));

    server::start(environment, &settings, flow).await
}
