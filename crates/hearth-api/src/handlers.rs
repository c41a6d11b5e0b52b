//! HTTP handlers for both services.
//!
//! Tool execution and chat always answer 200 with their respective
//! envelopes; only feedback distinguishes client errors (400 invalid
//! value, 404 unknown interaction) because callers branch on them.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use hearth_core::{
    ChatRequest, ChatResponse, Feedback, FeedbackRequest, FeedbackResponse, ToolCallRequest,
    ToolCallResponse,
};
use hearth_storage::LifecycleError;
use serde_json::{Value, json};

use crate::state::{ChatState, ToolsState};

// ============================================================================
// Tools service
// ============================================================================

pub async fn tools_health(State(state): State<ToolsState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "hearth-tools",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.registry.len(),
    }))
}

pub async fn list_tools(State(state): State<ToolsState>) -> Json<Value> {
    Json(json!({ "tools": state.registry.catalog() }))
}

pub async fn execute_tool(
    State(state): State<ToolsState>,
    Json(request): Json<ToolCallRequest>,
) -> Json<ToolCallResponse> {
    Json(state.registry.execute(&request).await)
}

// ============================================================================
// Chat service
// ============================================================================

pub async fn chat_health(State(state): State<ChatState>) -> Json<Value> {
    let engine = if state.engine.is_available().await {
        "connected"
    } else {
        "disconnected"
    };
    Json(json!({
        "status": "ok",
        "service": "hearth-chat",
        "version": env!("CARGO_PKG_VERSION"),
        "engine": engine,
        "model": state.engine.model_name(),
    }))
}

pub async fn chat(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    Json(
        state
            .router
            .route(&request.message, &request.session_id)
            .await,
    )
}

pub async fn submit_feedback(
    State(state): State<ChatState>,
    Json(request): Json<FeedbackRequest>,
) -> (StatusCode, Json<FeedbackResponse>) {
    let applied = state
        .router
        .lifecycle()
        .apply_feedback(
            &request.session_id,
            &request.interaction_id,
            &request.feedback,
        )
        .await;

    match applied {
        Ok(Feedback::ThumbsUp) => (
            StatusCode::OK,
            Json(FeedbackResponse {
                status: "success".to_string(),
                message: "Feedback recorded. This interaction will be kept permanently."
                    .to_string(),
            }),
        ),
        Ok(Feedback::ThumbsDown) => (
            StatusCode::OK,
            Json(FeedbackResponse {
                status: "success".to_string(),
                message: "Feedback recorded. This interaction has been removed.".to_string(),
            }),
        ),
        Err(e @ LifecycleError::InvalidFeedback(_)) => (
            StatusCode::BAD_REQUEST,
            Json(FeedbackResponse {
                status: "error".to_string(),
                message: e.to_string(),
            }),
        ),
        Err(e @ LifecycleError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(FeedbackResponse {
                status: "error".to_string(),
                message: e.to_string(),
            }),
        ),
    }
}

pub async fn list_interactions(
    State(state): State<ChatState>,
    Path(session_id): Path<String>,
) -> Json<Value> {
    let interactions = state.router.lifecycle().list_session(&session_id).await;
    Json(json!({
        "session_id": session_id,
        "count": interactions.len(),
        "interactions": interactions,
    }))
}
