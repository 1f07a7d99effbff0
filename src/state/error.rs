use thiserror::Error;

use crate::core::errors::ConfigError;
use crate::rag::error::{ChunkingError, EmbeddingError, GenerationError};

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize embedding backend: {0}")]
    Embedding(#[source] EmbeddingError),

    #[error("Failed to initialize generation backend: {0}")]
    Generation(#[source] GenerationError),

    #[error("Invalid chunking configuration: {0}")]
    Chunking(#[from] ChunkingError),
}
