use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::rag::QueryResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub question: String,
    pub top_k: Option<usize>,
}

/// Always answers 200; failures are reported in the body's `status`.
/// An unreadable body is answered as an invalid question.
pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Unreadable query body");
            return Json(QueryResponse::invalid_question(""));
        }
    };

    let response = state
        .query
        .answer_question(&payload.question, payload.top_k)
        .await;
    Json(response)
}
