//! In-memory [`ContentStore`] implementation for testing and embedding in
//! other processes.
//!
//! Uses a `HashMap` of collections behind `std::sync::RwLock`. Each
//! collection keeps rows in insertion order; an upsert with an existing id
//! overwrites the row in place. Search is brute-force cosine distance.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::models::{EmbeddingVector, IntelligenceRecord, ScoredRecord};

use super::{check_dims, rank_by_distance, ContentStore};

struct Collection {
    dims: usize,
    rows: Vec<EmbeddingVector>,
}

/// In-memory vector store.
pub struct InMemoryStore {
    embedder: Arc<dyn EmbeddingProvider>,
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of rows stored under `index`.
    pub fn count(&self, index: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(index).map(|col| col.rows.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Snapshot of one stored row.
    pub fn get(&self, index: &str, id: &str) -> Option<EmbeddingVector> {
        let collections = self.collections.read().ok()?;
        collections
            .get(index)?
            .rows
            .iter()
            .find(|row| row.id == id)
            .cloned()
    }

    async fn vectorize(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embedder.embed(text, None).await?;
        check_dims(self.embedder.dims(), vector.len())?;
        Ok(vector)
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::storage("in-memory store lock poisoned")
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn upsert(&self, record: &IntelligenceRecord) -> Result<()> {
        let vector = self.vectorize(record.content()).await?;

        let mut collections = self.collections.write().map_err(poisoned)?;
        let collection = collections
            .entry(record.index().to_string())
            .or_insert_with(|| Collection {
                dims: vector.len(),
                rows: Vec::new(),
            });
        check_dims(collection.dims, vector.len())?;

        let row = record.clone().into_vector(vector);
        match collection.rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => collection.rows.push(row),
        }
        Ok(())
    }

    async fn query(&self, query: &str, index: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
        let vector = self.vectorize(query).await?;

        let mut collections = self.collections.write().map_err(poisoned)?;
        let collection = collections
            .entry(index.to_string())
            .or_insert_with(|| Collection {
                dims: vector.len(),
                rows: Vec::new(),
            });
        check_dims(collection.dims, vector.len())?;

        Ok(rank_by_distance(
            &vector,
            collection.rows.iter().cloned(),
            top_k,
        ))
    }
}
