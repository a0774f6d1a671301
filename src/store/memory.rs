//! In-memory [`VectorStore`] implementation for tests and the `memory` backend.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Search is brute-force cosine
//! similarity over all stored vectors.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::IndexEntry;

use super::{rank, QueryResult, VectorStore};

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, IndexEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("memory store lock poisoned")
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn upsert(&self, entry: IndexEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize, model: &str) -> Result<QueryResult> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(rank(vector, top_k, model, entries.values().cloned()))
    }

    async fn get(&self, id: &str) -> Result<Option<IndexEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(id).cloned())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        Ok(entries.remove(id).is_some())
    }
}
