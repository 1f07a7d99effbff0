//! Ingestion: chunk a document, embed each chunk in order, append to the store.
//!
//! Embedding is sequential. A failure at chunk `i` stops the document there;
//! chunks `0..i` stay in the store and the error names `i`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::core::config::DuplicatePolicy;

use super::chunker::WordChunker;
use super::embedding::Embedder;
use super::error::IngestError;
use super::extract;
use super::store::{ChunkRecord, DocumentStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub chunks_added: usize,
}

#[derive(Clone)]
pub struct IngestionPipeline {
    store: Arc<DocumentStore>,
    embedder: Arc<dyn Embedder>,
    chunker: WordChunker,
    duplicate_policy: DuplicatePolicy,
    warn_threshold: usize,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Holds a source id for the duration of one ingest under the reject policy.
struct SourceClaim<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    source: String,
}

impl Drop for SourceClaim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.source);
    }
}

impl IngestionPipeline {
    pub fn new(store: Arc<DocumentStore>, embedder: Arc<dyn Embedder>, chunker: WordChunker) -> Self {
        Self {
            store,
            embedder,
            chunker,
            duplicate_policy: DuplicatePolicy::Append,
            warn_threshold: usize::MAX,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Log a warning whenever the store holds more than `threshold` records.
    pub fn with_warn_threshold(mut self, threshold: usize) -> Self {
        self.warn_threshold = threshold;
        self
    }

    pub fn chunker(&self) -> &WordChunker {
        &self.chunker
    }

    /// Reserves `source` so that a concurrent ingest of the same id is
    /// rejected too. The claim is released when the returned guard drops.
    fn claim_source(&self, source: &str) -> Result<SourceClaim<'_>, IngestError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if in_flight.contains(source) || self.store.contains_source(source) {
            return Err(IngestError::DuplicateSource(source.to_string()));
        }
        in_flight.insert(source.to_string());
        Ok(SourceClaim {
            in_flight: &self.in_flight,
            source: source.to_string(),
        })
    }

    /// Ingests already-extracted plain text under `source`.
    pub async fn ingest(&self, source: &str, raw_text: &str) -> Result<IngestReport, IngestError> {
        let _claim = match self.duplicate_policy {
            DuplicatePolicy::Reject => Some(self.claim_source(source)?),
            DuplicatePolicy::Append => None,
        };

        let chunks = self.chunker.chunks(raw_text);
        let total = chunks.len();
        tracing::info!(source, chunks = total, "Ingesting document");

        let mut added = 0;
        for (chunk_index, content) in chunks.enumerate() {
            tracing::debug!("Embedding chunk {}/{} of {}", chunk_index + 1, total, source);

            let embedding = self.embedder.embed(&content).await.map_err(|source_err| {
                tracing::error!(
                    source,
                    chunk_index,
                    error = %source_err,
                    "Embedding failed, aborting remaining chunks"
                );
                IngestError::Embedding {
                    source_id: source.to_string(),
                    chunk_index,
                    ingested: added,
                    source: source_err,
                }
            })?;

            let record = ChunkRecord::new(source, chunk_index, content, embedding);
            self.store
                .append(record)
                .map_err(|source| IngestError::Store {
                    chunk_index,
                    source,
                })?;
            added += 1;
        }

        let stored = self.store.len();
        if stored > self.warn_threshold {
            tracing::warn!(
                stored,
                threshold = self.warn_threshold,
                "Document store exceeds warning threshold; records are never evicted"
            );
        }

        tracing::info!(source, chunks_added = added, "Ingestion complete");
        Ok(IngestReport {
            source: source.to_string(),
            chunks_added: added,
        })
    }

    /// Extracts text from `bytes` (by file extension) and ingests it under `file_name`.
    pub async fn ingest_file(&self, file_name: &str, bytes: &[u8]) -> Result<IngestReport, IngestError> {
        let text = extract::extract_text(file_name, bytes)?;
        self.ingest(file_name, &text).await
    }

    /// Extracts and ingests a file; the source id is the file name.
    pub async fn ingest_path(&self, path: &Path) -> Result<IngestReport, IngestError> {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let text = extract::extract_file(path)?;
        self.ingest(&source, &text).await
    }

    /// Ingests every supported file directly inside `dir`, sorted by name.
    ///
    /// A failing file is logged and skipped; the reports of the files that
    /// succeeded are returned.
    pub async fn ingest_directory(&self, dir: &Path) -> Vec<IngestReport> {
        let mut files: Vec<_> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .filter(|path| {
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .and_then(extract::DocumentKind::from_name)
                        .is_some()
                })
                .collect(),
            Err(err) => {
                tracing::info!("No bootstrap documents at {}: {}", dir.display(), err);
                return Vec::new();
            }
        };
        files.sort();

        let mut reports = Vec::with_capacity(files.len());
        for path in files {
            match self.ingest_path(&path).await {
                Ok(report) => reports.push(report),
                Err(err) => tracing::warn!("Skipping {}: {}", path.display(), err),
            }
        }
        reports
    }
}
