mod accounts;
mod auth;
mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::jwt::JwtConfig;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::interview::coach::{InterviewCoach, LlmCoach};
use crate::interview::lifecycle::InterviewLifecycle;
use crate::interview::report_builder::ReportBuilder;
use crate::interview::store::{InterviewStore, PgInterviewStore};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
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

    info!("Starting PrepWise API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!(
        "LLM client initialized (model: {}, per-call deadline: {:?})",
        llm_client::MODEL,
        config.ai_timeout
    );

    let coach: Arc<dyn InterviewCoach> = Arc::new(LlmCoach::new(llm));
    let store: Arc<dyn InterviewStore> = Arc::new(PgInterviewStore::new(db.clone()));

    let lifecycle = Arc::new(InterviewLifecycle::new(
        store.clone(),
        coach.clone(),
        config.ai_timeout,
    ));
    let reports = Arc::new(ReportBuilder::new(store, coach, config.ai_timeout));

    let jwt = JwtConfig {
        secret: config.jwt_secret.clone(),
        expiry_hours: config.token_expiry_hours,
    };

    // Build app state
    let state = AppState {
        db,
        jwt,
        lifecycle,
        reports,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the frontend host once it is configurable

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
