//! Vector storage abstraction.
//!
//! The [`VectorStore`] trait is the only shared mutable resource in the
//! pipeline. Backends:
//!
//! | Backend | Type | Use |
//! |---------|------|-----|
//! | `sqlite` | [`SqliteStore`] | Default; persists across runs |
//! | `memory` | [`MemoryStore`] | Tests and throwaway sessions |
//!
//! Upserts are last-writer-wins and never duplicate an id.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::embedding::cosine_similarity;
use crate::models::{IndexEntry, Match};

/// Ranked matches plus the number of entries skipped because they were
/// embedded with a different model than the query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub matches: Vec<Match>,
    pub skipped_stale: usize,
}

/// Abstract vector store.
///
/// All operations are async (via `async-trait`); the in-memory store
/// returns immediately-ready futures.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the entry with `entry.id`.
    async fn upsert(&self, entry: IndexEntry) -> Result<()>;

    /// Cosine nearest-neighbour search over entries embedded with `model`.
    ///
    /// Returns at most `top_k` matches in descending score order.
    async fn query(&self, vector: &[f32], top_k: usize, model: &str) -> Result<QueryResult>;

    async fn get(&self, id: &str) -> Result<Option<IndexEntry>>;

    /// Number of stored entries, across all models.
    async fn count(&self) -> Result<usize>;

    /// Delete an entry. Returns whether it existed.
    async fn remove(&self, id: &str) -> Result<bool>;
}

/// Open the backend named by `[store] backend`.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => Ok(Arc::new(SqliteStore::open(config).await?)),
        other => bail!("Unknown store backend: {}", other),
    }
}

/// Score `candidates` against `query`, keeping the best `top_k`.
///
/// Shared by both backends so ranking is identical regardless of storage.
pub(crate) fn rank<I>(query: &[f32], top_k: usize, model: &str, candidates: I) -> QueryResult
where
    I: IntoIterator<Item = IndexEntry>,
{
    let mut skipped_stale = 0;
    let mut matches: Vec<Match> = candidates
        .into_iter()
        .filter(|entry| {
            let fresh = entry.metadata.model == model;
            if !fresh {
                skipped_stale += 1;
            }
            fresh
        })
        .map(|entry| Match {
            score: cosine_similarity(query, &entry.vector),
            id: entry.id,
            metadata: entry.metadata,
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    matches.truncate(top_k);

    QueryResult {
        matches,
        skipped_stale,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{EntryMetadata, IndexEntry};

    pub fn entry(id: &str, vector: Vec<f32>, model: &str, text: &str) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            vector,
            metadata: EntryMetadata {
                text: text.to_string(),
                model: model.to_string(),
                content_hash: format!("hash-{}", text),
                language: Some("eng".to_string()),
                source_format: None,
                indexed_at: 1_700_000_000,
            },
        }
    }
}
