use async_trait::async_trait;

use super::types::GenerationRequest;
use crate::rag::error::GenerationError;

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend name (e.g. "ollama", "huggingface").
    fn name(&self) -> &str;

    /// Non-streaming completion of a single prompt. Returns the raw text.
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
