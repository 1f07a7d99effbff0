//! Similarity retrieval over a store snapshot.

use std::sync::Arc;

use super::embedding::Embedder;
use super::error::RetrievalError;
use super::similarity::cosine_similarity;
use super::store::{ChunkRecord, DocumentStore};

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub record: Arc<ChunkRecord>,
    pub score: f32,
}

#[derive(Clone)]
pub struct Retriever {
    store: Arc<DocumentStore>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(store: Arc<DocumentStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Returns the `top_k` chunks most similar to `query`, best first.
    ///
    /// An empty store yields an empty result without calling the embedder.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>, RetrievalError> {
        if self.store.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let records = self.store.all_records();
        let results = rank(records, &query_embedding, top_k)?;

        tracing::debug!(
            top_k,
            returned = results.len(),
            best = results.first().map(|c| c.score),
            "Retrieved chunks"
        );
        Ok(results)
    }
}

/// Scores every record against `query_embedding` and keeps the best `top_k`.
///
/// Ties keep store order.
pub fn rank(
    records: Vec<Arc<ChunkRecord>>,
    query_embedding: &[f32],
    top_k: usize,
) -> Result<Vec<ScoredChunk>, RetrievalError> {
    let mut scored = records
        .into_iter()
        .map(|record| -> Result<ScoredChunk, RetrievalError> {
            let score = cosine_similarity(query_embedding, &record.embedding)?;
            Ok(ScoredChunk { record, score })
        })
        .collect::<Result<Vec<_>, _>>()?;

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    Ok(scored)
}
