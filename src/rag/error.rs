//! Failure kinds of the RAG core.
//!
//! Lower layers fail fast with one of these; only the query service turns
//! them into a degraded answer.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkingError {
    #[error("invalid chunk window: size {window_size}, overlap {overlap} (overlap must be smaller than a non-zero window)")]
    InvalidWindow { window_size: usize, overlap: usize },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
    #[error("document {0} contains no extractable text")]
    Empty(String),
    #[error("document {name} is not valid UTF-8 text")]
    InvalidText {
        name: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("failed to extract text from PDF {name}: {reason}")]
    Pdf { name: String, reason: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Embedding backend failures. Transport problems are kept apart from a
/// reachable backend that answered with something unusable.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding backend timed out after {0}s")]
    Timeout(u64),
    #[error("embedding backend unreachable: {0}")]
    Transport(String),
    #[error("embedding backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation backend timed out after {0}s")]
    Timeout(u64),
    #[error("generation backend unreachable: {0}")]
    Transport(String),
    #[error("generation backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
    #[error("generation backend reported an error: {0}")]
    BackendReported(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("embedding dimension {actual} does not match store dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("record has an empty embedding")]
    EmptyEmbedding,
    #[error("record has empty content")]
    EmptyContent,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Chunking(#[from] ChunkingError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("source {0} has already been ingested")]
    DuplicateSource(String),
    #[error("embedding failed for {source_id} at chunk {chunk_index} ({ingested} chunks kept): {source}")]
    Embedding {
        source_id: String,
        chunk_index: usize,
        ingested: usize,
        #[source]
        source: EmbeddingError,
    },
    #[error("store rejected chunk {chunk_index}: {source}")]
    Store {
        chunk_index: usize,
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    /// Chunk index at which processing stopped, for mid-document failures.
    pub fn failed_chunk_index(&self) -> Option<usize> {
        match self {
            IngestError::Embedding { chunk_index, .. } | IngestError::Store { chunk_index, .. } => {
                Some(*chunk_index)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("query embedding dimension {actual} does not match store dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
