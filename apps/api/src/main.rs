mod admin;
mod analytics;
mod auth;
mod batch;
mod challenges;
mod config;
mod db;
mod errors;
mod ideas;
mod listing;
mod llm_client;
mod matching;
mod messages;
mod models;
mod profiles;
mod routes;
mod skills;
mod state;
mod sync;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::matching::scoring::LevelDeltaScorer;
use crate::routes::build_router;
use crate::state::AppState;

/// Timeout for calls to the HR system and the mail API.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Talent API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config).await?;

    // Initialize LLM client
    let llm = match config.anthropic_api_key.clone() {
        Some(key) => LlmClient::new(Some(key))?,
        None => LlmClient::disabled(),
    };
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        info!("ANTHROPIC_API_KEY not set; LLM-enriched fields use their fallbacks");
    }

    let http = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()?;

    // Initialize skill scorer (LevelDeltaScorer by default)
    let skill_scorer = Arc::new(LevelDeltaScorer);

    // Build app state
    let state = AppState {
        db,
        llm,
        http,
        config: config.clone(),
        skill_scorer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
