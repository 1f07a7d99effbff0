//! Retrieval-augmented generation core.
//!
//! Ingestion writes embedded chunks into the [`DocumentStore`]; the
//! [`QueryService`] reads them back through the [`Retriever`] and hands the
//! best matches to the [`Generator`].

pub mod chunker;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generator;
pub mod ingest;
pub mod prompt;
pub mod retriever;
pub mod service;
pub mod similarity;
pub mod store;

pub use chunker::WordChunker;
pub use embedding::{build_embedder, Embedder};
pub use generator::Generator;
pub use ingest::{IngestReport, IngestionPipeline};
pub use retriever::{Retriever, ScoredChunk};
pub use service::{ErrorKind, QueryResponse, QueryService, QueryStatus, SourceRef};
pub use store::{ChunkRecord, DocumentStore};
