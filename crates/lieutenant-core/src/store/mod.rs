//! Storage abstraction for Lieutenant.
//!
//! The [`ContentStore`] trait is the only persistence seam of the ingestion
//! and retrieval pipelines, enabling pluggable backends (SQLite, a remote
//! vector embedding service, in-memory).
//!
//! A store owns both halves of a write: it vectorizes the record through its
//! [`EmbeddingProvider`](crate::embedding::EmbeddingProvider) and persists
//! the result only if vectorization succeeded.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::embedding::cosine_distance;
use crate::error::{Error, Result};
use crate::models::{EmbeddingVector, IntelligenceRecord, ScoredRecord};

/// Result cap used when callers do not specify one.
pub const DEFAULT_TOP_K: usize = 10;

/// Abstract vector store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](ContentStore::upsert) | Vectorize and insert-or-overwrite by `(index, id)` |
/// | [`query`](ContentStore::query) | Nearest neighbours of a text within one index |
///
/// Both operations create the index's collection on first use.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Vectorize `record.content` and persist it keyed by `(index, id)`,
    /// replacing any existing row with the same key.
    async fn upsert(&self, record: &IntelligenceRecord) -> Result<()>;

    /// Vectorize `query` and return up to `top_k` records of `index`,
    /// closest first.
    async fn query(&self, query: &str, index: &str, top_k: usize) -> Result<Vec<ScoredRecord>>;
}

/// Fail with [`Error::Dimension`] unless `actual == expected`.
///
/// An `expected` of zero means "not configured" and accepts anything.
pub fn check_dims(expected: usize, actual: usize) -> Result<()> {
    if expected != 0 && expected != actual {
        return Err(Error::Dimension { expected, actual });
    }
    Ok(())
}

/// Rank stored rows by ascending cosine distance to `query_vec`.
///
/// The sort is stable, so rows at equal distance keep their storage order.
pub fn rank_by_distance(
    query_vec: &[f32],
    rows: impl IntoIterator<Item = EmbeddingVector>,
    top_k: usize,
) -> Vec<ScoredRecord> {
    let mut scored: Vec<ScoredRecord> = rows
        .into_iter()
        .map(|row| {
            let distance = cosine_distance(query_vec, &row.embedding);
            ScoredRecord {
                record: IntelligenceRecord::restore(row.id, row.index, row.source, row.content),
                distance,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);
    scored
}
