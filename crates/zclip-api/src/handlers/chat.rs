//! Chat assistant handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zclip_models::{ChatTurn, ConversationState};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::{sanitize_string, MAX_MESSAGE_LENGTH};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub conversation_state: ConversationState,
}

/// Answer a chat message.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload?;

    let message = sanitize_string(request.message.trim(), MAX_MESSAGE_LENGTH);
    if message.is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }

    let reply = state.assistant.respond(&message, &request.history).await;

    debug!(
        state = reply.conversation_state.as_str(),
        fallback = reply.fallback,
        "Chat reply generated"
    );
    metrics::record_chat_message(reply.conversation_state.as_str());

    Ok(Json(ChatResponse {
        success: true,
        response: reply.response,
        conversation_state: reply.conversation_state,
    }))
}
