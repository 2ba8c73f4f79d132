use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub const ROOT_MESSAGE: &str = "Cardiology AI Backend is Running!";

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": ROOT_MESSAGE }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "embedding": {
            "provider": state.embedder.name(),
            "dimension": state.embedder.dimension(),
        },
        "index": {
            "provider": state.index.name(),
            "name": state.config.index.name,
        },
        "generation": state.generator.name(),
        "prompt_template": state.query.template().label(),
    }))
}
