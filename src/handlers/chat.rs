use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::dialogue;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: IncomingMessage,
}

#[derive(Deserialize)]
pub struct IncomingMessage {
    pub content: String,
    /// Session identifier; callers without one share the default session.
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub message: OutgoingMessage,
}

#[derive(Serialize)]
pub struct OutgoingMessage {
    pub content: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let session = payload
        .message
        .id
        .unwrap_or_else(|| "default".to_string());
    let text = payload.message.content.trim().to_string();

    tracing::info!(session = %session, text = %text, "incoming message");

    let reply = dialogue::handle_turn(&state, &session, &text).await?;

    Ok(Json(ChatResponse {
        message: OutgoingMessage { content: reply },
    }))
}
