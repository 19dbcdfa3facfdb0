//! Agent HTTP Server
//!
//! Axum server exposing one chat session: send a turn, read the history,
//! clear it. Provider and tools are configured from `AGENT_*` variables.

mod handlers;
mod state;

use axum::{routing::{get, post}, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::handlers::{chat_handler, clear_session, health_check, list_messages};
use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .route("/api/messages", get(list_messages))
        .route("/api/session/clear", post(clear_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = agent_runtime::config::from_env()?;
    config.ensure_usable()?;

    if config.is_real_capable() {
        tracing::info!(
            "✓ Provider: {:?} at {} (model {})",
            config.provider_kind,
            config.base_url,
            config.model
        );
    } else {
        tracing::warn!("⚠ No API key configured - running in simulation mode");
        tracing::warn!("  Set AGENT_API_KEY (or AGENT_PROVIDER=proxy) in .env");
    }

    let state = AppState::new(config);
    tracing::info!("Registered {} tools:", state.agent.tools().len());
    for name in state.agent.tools().names() {
        tracing::info!("  • {}", name);
    }

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 agent server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  POST /api/chat           - Run one turn");
    tracing::info!("  GET  /api/messages       - Conversation history");
    tracing::info!("  POST /api/session/clear  - Reset the conversation");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
