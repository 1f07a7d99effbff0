//! Language-model generation backends.
//!
//! Like the embedders, the backend is resolved once from settings and shared
//! as an `Arc<dyn GenerationBackend>`.

mod huggingface;
mod ollama;
pub mod provider;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::core::config::BackendSelection;
use crate::rag::error::GenerationError;

pub use huggingface::HuggingFaceGenerator;
pub use ollama::OllamaGenerator;
pub use provider::GenerationBackend;
pub use types::GenerationRequest;

pub fn build_generation_backend(
    selection: &BackendSelection,
    timeout: Duration,
) -> Result<Arc<dyn GenerationBackend>, GenerationError> {
    let backend: Arc<dyn GenerationBackend> = match selection {
        BackendSelection::HuggingFace {
            endpoint,
            model,
            token,
        } => Arc::new(HuggingFaceGenerator::new(endpoint, model, token, timeout)?),
        BackendSelection::Ollama { host, model } => {
            Arc::new(OllamaGenerator::new(host, model, timeout)?)
        }
    };
    Ok(backend)
}

fn http_client(timeout: Duration) -> Result<Client, GenerationError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::Transport(e.to_string()))
}

fn request_error(err: reqwest::Error, timeout: Duration) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout(timeout.as_secs())
    } else {
        GenerationError::Transport(err.to_string())
    }
}

/// Parses a response body, surfacing an `{"error": ...}` payload as
/// `BackendReported` whatever the HTTP status. Other non-success responses
/// become `Status`.
fn parse_body(status: StatusCode, text: String) -> Result<Value, GenerationError> {
    let payload = serde_json::from_str::<Value>(&text).ok();
    if let Some(message) = payload
        .as_ref()
        .and_then(|p| p.get("error"))
        .and_then(Value::as_str)
    {
        return Err(GenerationError::BackendReported(message.to_string()));
    }
    if !status.is_success() {
        return Err(GenerationError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    payload.ok_or_else(|| GenerationError::MalformedResponse("response body is not JSON".to_string()))
}
