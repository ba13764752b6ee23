//! SQLite-backed [`VectorStore`].
//!
//! One `docs` table keyed by a unique `doc_hash`, with vectors stored as
//! little-endian `f32` blobs. Nearest-neighbor search is an exact scan in
//! Rust, ordered by Euclidean distance and then by row id. The schema
//! dimension is recorded in `store_meta`; opening a database created with a
//! different dimension fails in [`ensure_schema`](VectorStore::ensure_schema).

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use docvec_core::embedding::{blob_to_vec, euclidean_distance, vec_to_blob};
use docvec_core::models::{Neighbor, StoreStats, StoredRecord};
use docvec_core::store::{check_dims, InsertOutcome, VectorStore};

use crate::db;

pub struct SqliteStore {
    pool: SqlitePool,
    dims: usize,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, dims: usize) -> Self {
        Self { pool, dims }
    }

    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path, dims: usize) -> Result<Self> {
        Ok(Self::new(db::connect(path).await?, dims))
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS docs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                doc_hash TEXT NOT NULL UNIQUE,
                filename TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_docs_filename ON docs(filename)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let recorded: Option<String> =
            sqlx::query_scalar("SELECT value FROM store_meta WHERE key = 'dims'")
                .fetch_optional(&self.pool)
                .await?;

        match recorded {
            None => {
                sqlx::query("INSERT INTO store_meta (key, value) VALUES ('dims', ?)")
                    .bind(self.dims.to_string())
                    .execute(&self.pool)
                    .await?;
            }
            Some(value) if value == self.dims.to_string() => {}
            Some(value) => bail!(
                "database was created with {} dimensions, configured for {}",
                value,
                self.dims
            ),
        }

        Ok(())
    }

    async fn exists(&self, digest: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM docs WHERE doc_hash = ?")
            .bind(digest)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_batch(&self, records: &[StoredRecord]) -> Result<Vec<InsertOutcome>> {
        for r in records {
            check_dims(self.dims, r.vector.len())?;
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(records.len());

        for r in records {
            let result = sqlx::query(
                r#"
                INSERT INTO docs (doc_hash, filename, content, embedding, created_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(doc_hash) DO NOTHING
                "#,
            )
            .bind(&r.digest)
            .bind(&r.filename)
            .bind(&r.content)
            .bind(vec_to_blob(&r.vector))
            .bind(now)
            .execute(&mut *tx)
            .await?;

            outcomes.push(if result.rows_affected() == 1 {
                InsertOutcome::Inserted
            } else {
                InsertOutcome::Duplicate
            });
        }

        tx.commit().await?;
        Ok(outcomes)
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        check_dims(self.dims, query.len())?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT filename, content, embedding FROM docs ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut candidates: Vec<Neighbor> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                Neighbor {
                    filename: row.get("filename"),
                    content: row.get("content"),
                    distance: euclidean_distance(query, &blob_to_vec(&blob)),
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(k);

        Ok(candidates)
    }

    async fn aggregate_stats(&self) -> Result<StoreStats> {
        let (total, files): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COUNT(DISTINCT filename) FROM docs")
                .fetch_one(&self.pool)
                .await?;
        Ok(StoreStats {
            unique_files: files as u64,
            total_chunks: total as u64,
        })
    }

    async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM docs")
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
