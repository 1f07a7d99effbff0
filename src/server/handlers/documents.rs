use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::rag::ChunkRecord;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// A stored chunk without its vector.
#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub id: Uuid,
    pub content: String,
    pub source: String,
    pub chunk_index: usize,
    pub timestamp: DateTime<Utc>,
    pub embedding_dim: usize,
}

impl From<&ChunkRecord> for DocumentView {
    fn from(record: &ChunkRecord) -> Self {
        Self {
            id: record.id,
            content: record.content.clone(),
            source: record.source.clone(),
            chunk_index: record.chunk_index,
            timestamp: record.timestamp,
            embedding_dim: record.dimension(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub source: String,
    pub text: String,
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let documents: Vec<DocumentView> = state
        .store
        .recent(limit)
        .iter()
        .map(|record| DocumentView::from(record.as_ref()))
        .collect();
    Json(documents)
}

pub async fn ingest_document(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let source = payload.source.trim();
    if source.is_empty() {
        return Err(ApiError::BadRequest("source is required".to_string()));
    }
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required".to_string()));
    }

    let report = state.ingestion.ingest(source, &payload.text).await?;
    Ok(Json(report))
}
