//! POST /chat - supportive reply to a free-form message.

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{resolve_user_id, ApiError};
use super::state::{GuardedChatbot, ServerState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub emotion_state: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub emotion_context: String,
    pub timestamp: DateTime<Utc>,
}

async fn chat(
    State(chatbot): State<GuardedChatbot>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let user_id = resolve_user_id(request.user_id.as_deref())?;
    debug!(user_id = %user_id, "Chat message: {}", request.message);

    let (reply, source) = chatbot
        .respond(request.emotion_state.as_deref(), &request.message)
        .await;
    info!(user_id = %user_id, source = source.as_str(), "Chat reply generated");

    Ok(Json(ChatResponse {
        reply,
        emotion_context: request.emotion_state.unwrap_or_default(),
        timestamp: Utc::now(),
    }))
}

pub fn chat_routes() -> Router<ServerState> {
    Router::new().route("/chat", post(chat))
}
