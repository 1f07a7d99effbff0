//! Text embedding backends.
//!
//! The backend is chosen once from settings (see
//! [`crate::core::config::BackendSelection`]) and injected as an
//! `Arc<dyn Embedder>`; call sites never branch on which service is in use.

mod huggingface;
mod ollama;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::core::config::BackendSelection;

use super::error::EmbeddingError;

pub use huggingface::HuggingFaceEmbedder;
pub use ollama::OllamaEmbedder;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Backend name (e.g. "ollama", "huggingface").
    fn name(&self) -> &str;

    /// Embeds a single text. No retries are attempted.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

pub fn build_embedder(
    selection: &BackendSelection,
    timeout: Duration,
) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let embedder: Arc<dyn Embedder> = match selection {
        BackendSelection::HuggingFace {
            endpoint,
            model,
            token,
        } => Arc::new(HuggingFaceEmbedder::new(endpoint, model, token, timeout)?),
        BackendSelection::Ollama { host, model } => {
            Arc::new(OllamaEmbedder::new(host, model, timeout)?)
        }
    };
    Ok(embedder)
}

fn http_client(timeout: Duration) -> Result<Client, EmbeddingError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EmbeddingError::Transport(e.to_string()))
}

fn request_error(err: reqwest::Error, timeout: Duration) -> EmbeddingError {
    if err.is_timeout() {
        EmbeddingError::Timeout(timeout.as_secs())
    } else {
        EmbeddingError::Transport(err.to_string())
    }
}

/// Reads a response body, mapping non-success statuses to `Status`.
async fn success_body(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<String, EmbeddingError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| request_error(e, timeout))?;
    if !status.is_success() {
        return Err(EmbeddingError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn validate_vector(vector: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
    if vector.is_empty() {
        return Err(EmbeddingError::MalformedResponse(
            "embedding vector is empty".to_string(),
        ));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::MalformedResponse(
            "embedding vector contains non-finite values".to_string(),
        ));
    }
    Ok(vector)
}
