//! Content digests used as the deduplication key.
//!
//! A digest is the lowercase hex SHA-1 of the exact chunk text. It does
//! not involve the filename, so the same text arriving from two files, or
//! from a second run, maps to the same key. Any whitespace difference
//! (for example after changing chunk size or overlap) yields a new digest
//! and the chunk is stored again; that churn is accepted.

use anyhow::Result;
use sha1::{Digest, Sha1};

use crate::store::VectorStore;

/// Length of a digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 40;

/// Hex SHA-1 of `text`.
pub fn content_digest(text: &str) -> String {
    hex::encode(Sha1::digest(text.as_bytes()))
}

/// Whether `digest` is already persisted in `store`.
pub async fn is_known(store: &dyn VectorStore, digest: &str) -> Result<bool> {
    store.exists(digest).await
}
