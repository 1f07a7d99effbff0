use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "records": state.store.len(),
        "embedding_dimension": state.store.dimension(),
        "embedding_backend": state.embedding_backend,
        "generation_backend": state.generation_backend,
        "started_at": state.started_at.to_rfc3339(),
    }))
}
