//! Question answering: retrieval followed by generation.
//!
//! This is the one place where failures are softened. Every outcome becomes
//! a `QueryResponse` with a readable answer and an explicit status.

use serde::Serialize;

use super::error::RetrievalError;
use super::generator::Generator;
use super::retriever::{Retriever, ScoredChunk};

pub const NO_DOCUMENTS_ANSWER: &str =
    "No documents are currently indexed. Please upload and index documents first.";
pub const INVALID_QUESTION_ANSWER: &str = "Please provide a valid question.";
pub const GENERATION_FAILED_ANSWER: &str =
    "I found relevant documents but could not generate a response. Please try rephrasing your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    NoDocuments,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidQuestion,
    EmbeddingBackend,
    Retrieval,
    GenerationBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub source: String,
    pub chunk_index: usize,
    pub content: String,
    pub score: f32,
}

impl From<&ScoredChunk> for SourceRef {
    fn from(chunk: &ScoredChunk) -> Self {
        Self {
            source: chunk.record.source.clone(),
            chunk_index: chunk.record.chunk_index,
            content: chunk.record.content.clone(),
            score: chunk.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub status: QueryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl QueryResponse {
    fn degraded(question: &str, answer: String, kind: ErrorKind, sources: Vec<SourceRef>) -> Self {
        Self {
            question: question.to_string(),
            answer,
            sources,
            status: QueryStatus::Error,
            error_kind: Some(kind),
        }
    }

    /// The answer for a missing, blank or unreadable question.
    pub fn invalid_question(question: &str) -> Self {
        Self::degraded(
            question,
            INVALID_QUESTION_ANSWER.to_string(),
            ErrorKind::InvalidQuestion,
            Vec::new(),
        )
    }
}

#[derive(Clone)]
pub struct QueryService {
    retriever: Retriever,
    generator: Generator,
    default_top_k: usize,
    max_top_k: usize,
}

impl QueryService {
    pub fn new(retriever: Retriever, generator: Generator) -> Self {
        Self {
            retriever,
            generator,
            default_top_k: 3,
            max_top_k: 5,
        }
    }

    pub fn with_top_k_bounds(mut self, default_top_k: usize, max_top_k: usize) -> Self {
        self.max_top_k = max_top_k.max(1);
        self.default_top_k = default_top_k.clamp(1, self.max_top_k);
        self
    }

    /// Effective `top_k`: the default when absent, clamped to `1..=max_top_k`.
    pub fn resolve_top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_top_k)
            .clamp(1, self.max_top_k)
    }

    pub async fn answer_question(&self, question: &str, top_k: Option<usize>) -> QueryResponse {
        let question = question.trim();
        if question.is_empty() {
            tracing::warn!("Rejected empty question");
            return QueryResponse::invalid_question(question);
        }

        if self.retriever.store().is_empty() {
            tracing::info!("Query received with no indexed documents");
            return QueryResponse {
                question: question.to_string(),
                answer: NO_DOCUMENTS_ANSWER.to_string(),
                sources: Vec::new(),
                status: QueryStatus::NoDocuments,
                error_kind: None,
            };
        }

        let top_k = self.resolve_top_k(top_k);
        let chunks = match self.retriever.retrieve(question, top_k).await {
            Ok(chunks) => chunks,
            Err(RetrievalError::Embedding(err)) => {
                tracing::error!(error = %err, "Query embedding failed");
                return QueryResponse::degraded(
                    question,
                    format!("Error generating embedding for your question: {}", err),
                    ErrorKind::EmbeddingBackend,
                    Vec::new(),
                );
            }
            Err(err) => {
                tracing::error!(error = %err, "Retrieval failed");
                return QueryResponse::degraded(
                    question,
                    format!("Error searching documents: {}", err),
                    ErrorKind::Retrieval,
                    Vec::new(),
                );
            }
        };
        let sources: Vec<SourceRef> = chunks.iter().map(SourceRef::from).collect();

        match self.generator.generate(&chunks, question).await {
            Ok(answer) => {
                tracing::info!(top_k, sources = sources.len(), "Answered query");
                QueryResponse {
                    question: question.to_string(),
                    answer,
                    sources,
                    status: QueryStatus::Success,
                    error_kind: None,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Returning degraded answer after generation failure");
                QueryResponse::degraded(
                    question,
                    GENERATION_FAILED_ANSWER.to_string(),
                    ErrorKind::GenerationBackend,
                    sources,
                )
            }
        }
    }
}
