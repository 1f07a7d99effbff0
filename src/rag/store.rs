//! Process-lifetime, append-only chunk store.
//!
//! Records live behind a single `RwLock` and are handed out as `Arc`s, so a
//! snapshot is a cheap copy of pointers and never observes a half-written
//! record. There is no eviction: the store grows until the process exits.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StoreError;

/// One embedded chunk of a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: Uuid,
    pub content: String,
    pub embedding: Vec<f32>,
    /// Originating document identifier (file name or logical id).
    pub source: String,
    /// Position within the source, 0-based.
    pub chunk_index: usize,
    /// Ingestion time, serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
}

impl ChunkRecord {
    pub fn new(
        source: impl Into<String>,
        chunk_index: usize,
        content: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            embedding,
            source: source.into(),
            chunk_index,
            timestamp: Utc::now(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

#[derive(Default)]
struct StoreInner {
    records: Vec<Arc<ChunkRecord>>,
    dimension: Option<usize>,
}

#[derive(Default)]
pub struct DocumentStore {
    inner: RwLock<StoreInner>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends a record. The first record fixes the embedding dimension;
    /// later records with a different dimension are rejected.
    pub fn append(&self, record: ChunkRecord) -> Result<(), StoreError> {
        if record.content.trim().is_empty() {
            return Err(StoreError::EmptyContent);
        }
        if record.embedding.is_empty() {
            return Err(StoreError::EmptyEmbedding);
        }

        let record = Arc::new(record);
        let mut inner = self.write();
        match inner.dimension {
            Some(expected) if expected != record.dimension() => {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: record.dimension(),
                });
            }
            Some(_) => {}
            None => inner.dimension = Some(record.dimension()),
        }
        inner.records.push(record);
        Ok(())
    }

    /// Snapshot of every record in insertion order.
    pub fn all_records(&self) -> Vec<Arc<ChunkRecord>> {
        self.read().records.clone()
    }

    /// The last `n` records in insertion order.
    pub fn recent(&self, n: usize) -> Vec<Arc<ChunkRecord>> {
        let inner = self.read();
        let start = inner.records.len().saturating_sub(n);
        inner.records[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimension fixed by the first appended record.
    pub fn dimension(&self) -> Option<usize> {
        self.read().dimension
    }

    pub fn contains_source(&self, source: &str) -> bool {
        self.read().records.iter().any(|r| r.source == source)
    }
}
