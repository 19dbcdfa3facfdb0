//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, Message, ProviderKind, ReplySource, Role};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: ProviderKind,
    pub real_capable: bool,
    pub busy: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Closing text of the turn
    pub reply: Option<String>,
    /// Every assistant text produced this turn, in order
    pub replies: Vec<String>,
    pub provider: ReplySource,
    pub notices: Vec<String>,
    pub tool_results: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn busy_error() -> ApiError {
    api_error(StatusCode::CONFLICT, "BUSY", AgentError::Busy.user_message())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider_kind,
        real_capable: state.agent.gateway().has_real_provider(),
        busy: state.busy.is_busy(),
    })
}

/// Run one turn
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "Message is empty"));
    }
    if state.busy.is_busy() {
        return Err(busy_error());
    }

    let mut session = state.session.lock().await;
    let start = session.message_count();
    let report = state
        .agent
        .run_turn(&mut session, &payload.message)
        .await
        .map_err(|e| {
            tracing::error!("Turn failed: {}", e);
            match &e {
                AgentError::Auth(_) => {
                    api_error(StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", e.user_message())
                }
                AgentError::Busy => busy_error(),
                _ => api_error(StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR", e.user_message()),
            }
        })?;

    let replies = session.conversation.messages()[start..]
        .iter()
        .filter(|m| m.role == Role::Assistant && !m.content.is_empty())
        .map(|m| m.content.clone())
        .collect();

    Ok(Json(ChatResponse {
        reply: report.reply,
        replies,
        provider: report.source,
        notices: report.notices,
        tool_results: report.tool_results,
    }))
}

/// Conversation snapshot
pub async fn list_messages(State(state): State<AppState>) -> Json<Vec<Message>> {
    let session = state.session.lock().await;
    Json(session.conversation.snapshot())
}

/// Whole-session reset
pub async fn clear_session(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    if state.busy.is_busy() {
        return Err(busy_error());
    }

    let mut session = state.session.lock().await;
    session.clear();
    tracing::info!(session = %session.id, "Session cleared");
    Ok(StatusCode::NO_CONTENT)
}
