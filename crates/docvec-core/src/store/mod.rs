//! Storage abstraction for docvec.
//!
//! The [`VectorStore`] trait is everything the ingestion pipeline and the
//! query path need from a backend. Chunking, digests, vectorization and
//! ranking are written once against it; backends only decide how records
//! are laid out and how the nearest neighbors are found.
//!
//! Implementations must be `Send + Sync` to be shared across async tasks.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Neighbor, StoreStats, StoredRecord};

/// Result of writing one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The digest was already present (a concurrent writer won the race,
    /// or the record repeats within the batch). Not an error.
    Duplicate,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

/// Abstract vector storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ensure_schema`](VectorStore::ensure_schema) | Create the collection/table if missing |
/// | [`exists`](VectorStore::exists) | Check a digest before doing any embedding work |
/// | [`insert_batch`](VectorStore::insert_batch) | Persist one file's new records as a unit |
/// | [`insert`](VectorStore::insert) | Persist a single record |
/// | [`nearest`](VectorStore::nearest) | Up to `k` records, closest first |
/// | [`aggregate_stats`](VectorStore::aggregate_stats) | Record and distinct filename counts |
/// | [`count`](VectorStore::count) | Record count only |
/// | [`close`](VectorStore::close) | Release connections |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend identifier, e.g. `"sqlite"`.
    fn backend(&self) -> &'static str;

    /// Vector length baked into the schema.
    fn dims(&self) -> usize;

    /// Idempotently create the backing collection. Safe on every startup.
    async fn ensure_schema(&self) -> Result<()>;

    /// Whether a record with `digest` is persisted.
    async fn exists(&self, digest: &str) -> Result<bool>;

    /// Persist `records`, one outcome per record in order.
    ///
    /// On `Err`, none of the batch may remain visible: transactional
    /// backends roll back, others delete what they wrote.
    async fn insert_batch(&self, records: &[StoredRecord]) -> Result<Vec<InsertOutcome>>;

    /// Persist a single record.
    async fn insert(&self, record: &StoredRecord) -> Result<InsertOutcome> {
        let outcomes = self.insert_batch(std::slice::from_ref(record)).await?;
        Ok(outcomes.into_iter().next().unwrap_or(InsertOutcome::Duplicate))
    }

    /// Up to `k` records ordered by ascending Euclidean distance to `query`.
    ///
    /// Ties keep insertion order, so identical inputs give identical output.
    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Total record count and number of distinct filenames.
    async fn aggregate_stats(&self) -> Result<StoreStats>;

    /// Total record count. Backends override this when counting is cheaper
    /// than a full [`aggregate_stats`](VectorStore::aggregate_stats).
    async fn count(&self) -> Result<u64> {
        Ok(self.aggregate_stats().await?.total_chunks)
    }

    /// Release any held connections. The store must not be used afterwards.
    async fn close(&self) {}
}

/// Reject vectors whose length differs from the schema dimension.
pub fn check_dims(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        anyhow::bail!(
            "vector has {} dimensions, store expects {}",
            actual,
            expected
        );
    }
    Ok(())
}
