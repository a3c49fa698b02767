mod agent;
mod analysis;
mod config;
mod errors;
mod extract;
mod filters;
mod llm;
mod models;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm::provider::Provider;
use crate::llm::LlmClient;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Monday2Friday API v{}", env!("CARGO_PKG_VERSION"));

    // Resolve the LLM provider: explicit override, else key-prefix detection
    let provider = config
        .provider_override
        .unwrap_or_else(|| Provider::detect(&config.llm_api_key));
    info!("LLM provider: {provider}");

    let llm = LlmClient::new(
        config.llm_api_key.clone(),
        provider,
        config.http_referer.clone(),
        config.app_title.clone(),
    );

    // Build app state
    let state = AppState {
        llm,
        config: config.clone(),
        sessions: SessionStore::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
