use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::ChatMessage;
use crate::services::chat;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub session_id: String,
}

// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let last = payload
        .messages
        .last()
        .ok_or_else(|| AppError::BadRequest("Mensagens são obrigatórias".to_string()))?;
    if last.content.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Mensagem do usuário é obrigatória".to_string(),
        ));
    }

    let session_id = payload
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let response = chat::process_message(&state, &session_id, &payload.messages).await?;

    {
        let db = db::lock(&state.db)?;
        if let Err(e) = queries::expire_old_conversations(&db) {
            tracing::warn!(error = %e, "failed to purge expired sessions");
        }
    }

    Ok(Json(ChatResponse {
        success: true,
        response,
        session_id,
    }))
}
