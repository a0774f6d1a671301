//! Top-k retrieval.
//!
//! [`Retriever::retrieve`] is the lenient entry point used when answering
//! questions: any failure degrades to no context. [`Retriever::search`]
//! surfaces errors and scores for diagnostics.

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::error::RetrievalError;
use crate::models::Match;
use crate::store::VectorStore;

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Text of the `k` passages most similar to `query`, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<String> {
        match self.search(query, k).await {
            Ok(matches) => matches.into_iter().map(|m| m.metadata.text).collect(),
            Err(e) => {
                tracing::error!(error = %e, "retrieval failed; answering without context");
                Vec::new()
            }
        }
    }

    /// Scored matches for `query`, at most `k`, in descending score order.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Match>, RetrievalError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| RetrievalError::Embedding(format!("{:#}", e)))?;

        let result = self
            .store
            .query(&vector, k, self.embedder.model_name())
            .await
            .map_err(|e| RetrievalError::Store(format!("{:#}", e)))?;

        if result.skipped_stale > 0 {
            tracing::warn!(
                skipped = result.skipped_stale,
                model = self.embedder.model_name(),
                "skipped entries embedded with a different model; re-ingest to include them"
            );
        }

        Ok(result.matches)
    }
}
