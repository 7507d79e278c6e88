mod config;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod session;
mod source;
mod state;
mod workflow;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::llm_generator::LlmDocumentGenerator;
use crate::llm_client::retry::RetryingInvoker;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::registry::SessionRegistry;
use crate::session::service::TailorService;
use crate::source::FileSourceMaterial;
use crate::state::AppState;
use crate::workflow::WorkflowDeps;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client and the generator built on it
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let generator = Arc::new(LlmDocumentGenerator::new(llm));

    let policy = config.retry_policy()?;
    info!(
        "Retry policy: {} retries, base {:?}, factor {}, max {:?}, jitter {}",
        policy.max_retries, policy.base_delay, policy.backoff_factor, policy.max_delay, policy.jitter
    );

    let source = Arc::new(FileSourceMaterial::new(config.data_dir.clone()));
    info!("Source material directory: {}", config.data_dir.display());

    // Build app state
    let deps = WorkflowDeps {
        generator,
        invoker: RetryingInvoker::new(policy),
        source,
    };
    let state = AppState {
        service: TailorService::new(SessionRegistry::new(), deps),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web front end has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
