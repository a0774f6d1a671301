//! Embedding indexer.
//!
//! One embedding per document. The document id is the upsert key, so
//! re-indexing replaces the previous vector and text instead of adding a
//! second entry.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::embedding::Embedder;
use crate::error::IndexError;
use crate::models::{EntryMetadata, IndexEntry, SourceFormat};
use crate::store::VectorStore;

/// Key used when a caller indexes text without naming it.
pub const FALLBACK_DOC_ID: &str = "raw_input";

/// Optional metadata stored alongside the text.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub language: Option<String>,
    pub source_format: Option<SourceFormat>,
}

/// A validated, embedded document that has not been stored yet.
#[derive(Debug, Clone)]
pub struct Embedded {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
}

pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed `text` and upsert it under `doc_id` (or [`FALLBACK_DOC_ID`]).
    ///
    /// Returns the id the entry was stored under.
    pub async fn index(
        &self,
        doc_id: Option<&str>,
        text: &str,
        options: IndexOptions,
    ) -> Result<String, IndexError> {
        let embedded = self.embed(doc_id, text).await?;
        self.commit(embedded, options).await
    }

    /// First half of [`index`](Self::index): validate and embed, without
    /// touching the store. Lets callers compute metadata concurrently with
    /// the embedding call.
    pub async fn embed(&self, doc_id: Option<&str>, text: &str) -> Result<Embedded, IndexError> {
        let id = doc_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(FALLBACK_DOC_ID)
            .to_string();

        if text.trim().is_empty() {
            return Err(IndexError::EmptyText(id));
        }

        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| IndexError::Embedding(format!("{:#}", e)))?;

        let expected = self.embedder.dims();
        if expected > 0 && vector.len() != expected {
            return Err(IndexError::Dimensions {
                model: self.embedder.model_name().to_string(),
                expected,
                actual: vector.len(),
            });
        }

        Ok(Embedded {
            id,
            text: text.to_string(),
            vector,
        })
    }

    /// Second half of [`index`](Self::index): upsert an embedded document.
    pub async fn commit(
        &self,
        embedded: Embedded,
        options: IndexOptions,
    ) -> Result<String, IndexError> {
        let Embedded { id, text, vector } = embedded;
        let chars = text.len();

        let entry = IndexEntry {
            id: id.clone(),
            vector,
            metadata: EntryMetadata {
                content_hash: content_hash(&text),
                text,
                model: self.embedder.model_name().to_string(),
                language: options.language,
                source_format: options.source_format,
                indexed_at: chrono::Utc::now().timestamp(),
            },
        };

        self.store
            .upsert(entry)
            .await
            .map_err(|e| IndexError::Store(format!("{:#}", e)))?;

        tracing::debug!(doc_id = %id, chars, "indexed document");
        Ok(id)
    }
}

/// SHA-256 of the text, hex encoded.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use anyhow::Result;
    use async_trait::async_trait;

    struct LengthEmbedder {
        dims: usize,
        emit: usize,
    }

    #[async_trait]
    impl Embedder for LengthEmbedder {
        fn model_name(&self) -> &str {
            "length"
        }
        fn dims(&self) -> usize {
            self.dims
        }
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32; self.emit])
        }
    }

    fn indexer(dims: usize, emit: usize) -> (Indexer, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(Arc::new(LengthEmbedder { dims, emit }), store.clone());
        (indexer, store)
    }

    #[tokio::test]
    async fn missing_id_uses_fallback_key() {
        let (indexer, store) = indexer(2, 2);
        let id = indexer
            .index(None, "some clause", IndexOptions::default())
            .await
            .unwrap();
        assert_eq!(id, FALLBACK_DOC_ID);
        assert!(store.get(FALLBACK_DOC_ID).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn reindexing_is_idempotent() {
        let (indexer, store) = indexer(2, 2);
        for _ in 0..3 {
            indexer
                .index(Some("d1"), "same text", IndexOptions::default())
                .await
                .unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 1);
        let stored = store.get("d1").await.unwrap().unwrap();
        assert_eq!(stored.metadata.content_hash, content_hash("same text"));
        assert_eq!(stored.metadata.model, "length");
    }

    #[tokio::test]
    async fn rejects_blank_text() {
        let (indexer, store) = indexer(2, 2);
        let err = indexer
            .index(Some("d1"), "  \n\t ", IndexOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::EmptyText(id) if id == "d1"));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_wrong_dimensions() {
        let (indexer, _) = indexer(4, 3);
        let err = indexer
            .index(Some("d1"), "text", IndexOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::Dimensions {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn content_hash_is_stable_hex() {
        let h = content_hash("abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
