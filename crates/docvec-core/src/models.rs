//! Core data models shared by the ingestion and query paths.

use serde::Serialize;

/// Kind of document detected from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Classify an extension, ignoring ASCII case (no leading dot).
    pub fn from_extension(ext: &str) -> Self {
        if ext.eq_ignore_ascii_case("pdf") {
            DocumentKind::Pdf
        } else {
            DocumentKind::Text
        }
    }
}

/// The durable tuple persisted by a [`VectorStore`](crate::store::VectorStore).
///
/// `digest` is unique across the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub digest: String,
    pub filename: String,
    pub content: String,
    pub vector: Vec<f32>,
}

/// A nearest-neighbor match as reported by a store, before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub filename: String,
    /// Full stored content; truncation happens in [`rank`](crate::rank).
    pub content: String,
    /// Euclidean distance between the query and the stored vector.
    pub distance: f64,
}

/// A ranked query result handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHit {
    pub filename: String,
    pub content: String,
    pub score: f64,
}

/// Aggregate counts over the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub unique_files: u64,
    pub total_chunks: u64,
}

/// Counters for a single ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub files_processed: u64,
    pub chunks_added: u64,
    pub chunks_skipped: u64,
    pub errors: u64,
}
