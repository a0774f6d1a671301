//! SQLite-backed [`VectorStore`] implementation.
//!
//! Vectors live in the `entries` table as BLOBs. Search loads the rows for
//! the query model and ranks them in process; the corpus is one row per
//! document, so a full scan stays cheap.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::config::StoreConfig;
use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::models::{EntryMetadata, IndexEntry, SourceFormat};
use crate::{db, migrate};

use super::{rank, QueryResult, VectorStore};

/// SQLite implementation of the [`VectorStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Metadata fields without a dedicated column.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ExtraMetadata {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    source_format: Option<SourceFormat>,
}

impl SqliteStore {
    /// Connect and make sure the schema exists.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let pool = db::connect(config)
            .await
            .with_context(|| format!("Failed to open store at {}", config.path.display()))?;
        migrate::create_schema(&pool).await?;
        Ok(Self { pool })
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<IndexEntry> {
    let blob: Vec<u8> = row.try_get("vector")?;
    let metadata_json: String = row.try_get("metadata_json")?;
    let extra: ExtraMetadata = serde_json::from_str(&metadata_json).unwrap_or_default();

    Ok(IndexEntry {
        id: row.try_get("id")?,
        vector: blob_to_vec(&blob),
        metadata: EntryMetadata {
            text: row.try_get("text")?,
            model: row.try_get("model")?,
            content_hash: row.try_get("content_hash")?,
            language: extra.language,
            source_format: extra.source_format,
            indexed_at: row.try_get("updated_at")?,
        },
    })
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn upsert(&self, entry: IndexEntry) -> Result<()> {
        let extra = ExtraMetadata {
            language: entry.metadata.language.clone(),
            source_format: entry.metadata.source_format,
        };
        let metadata_json = serde_json::to_string(&extra)?;
        let blob = vec_to_blob(&entry.vector);

        sqlx::query(
            r#"
            INSERT INTO entries (id, model, dims, vector, text, metadata_json,
                                 content_hash, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                model = excluded.model,
                dims = excluded.dims,
                vector = excluded.vector,
                text = excluded.text,
                metadata_json = excluded.metadata_json,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.metadata.model)
        .bind(entry.vector.len() as i64)
        .bind(&blob)
        .bind(&entry.metadata.text)
        .bind(&metadata_json)
        .bind(&entry.metadata.content_hash)
        .bind(entry.metadata.indexed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize, model: &str) -> Result<QueryResult> {
        let skipped_stale: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE model != ?")
                .bind(model)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(
            "SELECT id, model, vector, text, metadata_json, content_hash, updated_at \
             FROM entries WHERE model = ?",
        )
        .bind(model)
        .fetch_all(&self.pool)
        .await?;

        let candidates = rows.iter().map(row_to_entry).collect::<Result<Vec<_>>>()?;
        let mut result = rank(vector, top_k, model, candidates);
        result.skipped_stale = skipped_stale as usize;
        Ok(result)
    }

    async fn get(&self, id: &str) -> Result<Option<IndexEntry>> {
        let row = sqlx::query(
            "SELECT id, model, vector, text, metadata_json, content_hash, updated_at \
             FROM entries WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn count(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
