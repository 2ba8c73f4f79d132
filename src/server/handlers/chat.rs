use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Failure kind when `answer` carries an error message instead of a reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Always answers 200 so chat clients can render failures inline.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    match state.query.answer(&request.question).await {
        Ok(answer) => {
            tracing::info!(sources = answer.sources.len(), "Answered question");
            Json(ChatResponse {
                answer: answer.text,
                error: None,
            })
        }
        Err(err) => {
            tracing::error!(kind = err.kind(), error = %err, "Chat request failed");
            Json(ChatResponse {
                answer: format!("**System Error:** {}", err),
                error: Some(err.kind().to_string()),
            })
        }
    }
}
