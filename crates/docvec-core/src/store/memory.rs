//! In-memory [`VectorStore`] for tests and throwaway runs.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`, with a digest index
//! for uniqueness. Nearest-neighbor search is an exact scan.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::euclidean_distance;
use crate::models::{Neighbor, StoreStats, StoredRecord};

use super::{check_dims, InsertOutcome, VectorStore};

#[derive(Default)]
struct Inner {
    records: Vec<StoredRecord>,
    by_digest: HashMap<String, usize>,
}

/// In-memory store. Contents vanish with the value.
pub struct InMemoryStore {
    dims: usize,
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(crate::embedding::DEFAULT_DIMS)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, digest: &str) -> Result<bool> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.by_digest.contains_key(digest))
    }

    async fn insert_batch(&self, records: &[StoredRecord]) -> Result<Vec<InsertOutcome>> {
        for r in records {
            check_dims(self.dims, r.vector.len())?;
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut outcomes = Vec::with_capacity(records.len());
        for r in records {
            if inner.by_digest.contains_key(&r.digest) {
                outcomes.push(InsertOutcome::Duplicate);
                continue;
            }
            let idx = inner.records.len();
            inner.by_digest.insert(r.digest.clone(), idx);
            inner.records.push(r.clone());
            outcomes.push(InsertOutcome::Inserted);
        }
        Ok(outcomes)
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        check_dims(self.dims, query.len())?;
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        let mut scored: Vec<(f64, &StoredRecord)> = inner
            .records
            .iter()
            .map(|r| (euclidean_distance(query, &r.vector), r))
            .collect();
        // Stable sort keeps insertion order among equal distances.
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, r)| Neighbor {
                filename: r.filename.clone(),
                content: r.content.clone(),
                distance,
            })
            .collect())
    }

    async fn aggregate_stats(&self) -> Result<StoreStats> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let files: HashSet<&str> = inner.records.iter().map(|r| r.filename.as_str()).collect();
        Ok(StoreStats {
            unique_files: files.len() as u64,
            total_chunks: inner.records.len() as u64,
        })
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.len() as u64)
    }
}
