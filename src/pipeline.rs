//! Ingestion orchestration and the query path.
//!
//! A [`Pipeline`] owns one store handle plus the walker, chunker and
//! embedder configured for it. Ingestion is sequential: for each file,
//! extract → chunk → dedup check → embed, then write the file's novel
//! chunks with a single [`VectorStore::insert_batch`] call. That call is
//! the commit boundary; a file whose write fails leaves nothing behind and
//! counts as one error.
//!
//! Queries embed the text with the same embedder, ask the store for
//! nearest neighbors and rank them.

use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use docvec_core::chunk::Chunker;
use docvec_core::digest::{content_digest, is_known};
use docvec_core::embedding::{Embedder, HashEmbedder};
use docvec_core::models::{IngestStats, QueryHit, StoreStats, StoredRecord};
use docvec_core::rank::rank;
use docvec_core::store::VectorStore;

use crate::config::Config;
use crate::extract::extract_file;
use crate::progress::{IngestProgressEvent, IngestProgressReporter};
use crate::walker::DocumentWalker;

pub struct Pipeline {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    walker: DocumentWalker,
    snippet_chars: usize,
}

/// Chunk counts for one successfully committed file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FileOutcome {
    added: u64,
    skipped: u64,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        chunker: Chunker,
        walker: DocumentWalker,
        snippet_chars: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            chunker,
            walker,
            snippet_chars,
        }
    }

    /// Build a pipeline over `store` using the deterministic hash embedder.
    pub fn from_config(config: &Config, store: Arc<dyn VectorStore>) -> Result<Self> {
        let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        let walker = DocumentWalker::from_config(config)?;
        let embedder = Arc::new(HashEmbedder::new(config.store.dims));
        tracing::debug!(
            embedder = embedder.model_name(),
            dims = embedder.dims(),
            backend = store.backend(),
            "pipeline configured"
        );
        Ok(Self::new(
            store,
            embedder,
            chunker,
            walker,
            config.retrieval.snippet_chars,
        ))
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Ingest every eligible file under `root`.
    ///
    /// Returns an error only if `root` is missing or not a directory.
    /// Per-file failures are logged and counted in [`IngestStats::errors`].
    pub async fn ingest(
        &self,
        root: &Path,
        progress: &dyn IngestProgressReporter,
    ) -> Result<IngestStats> {
        progress.report(IngestProgressEvent::Discovering {
            root: root.display().to_string(),
        });
        let files: Vec<_> = self.walker.walk(root)?.collect();
        let total = files.len() as u64;
        tracing::info!(root = %root.display(), files = total, "starting ingestion");

        let mut stats = IngestStats::default();

        for (i, file) in files.iter().enumerate() {
            let filename = file.path.display().to_string();
            progress.report(IngestProgressEvent::Ingesting {
                n: i as u64 + 1,
                total,
                file: filename.clone(),
            });

            let text = match extract_file(file).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %filename, error = %e, "skipping file");
                    stats.errors += 1;
                    continue;
                }
            };
            stats.files_processed += 1;

            match self.ingest_text(&filename, &text).await {
                Ok(outcome) => {
                    tracing::debug!(
                        file = %filename,
                        added = outcome.added,
                        skipped = outcome.skipped,
                        "committed file"
                    );
                    stats.chunks_added += outcome.added;
                    stats.chunks_skipped += outcome.skipped;
                }
                Err(e) => {
                    tracing::warn!(file = %filename, error = %e, "store write failed, file rolled back");
                    stats.errors += 1;
                }
            }
        }

        tracing::info!(
            files_processed = stats.files_processed,
            chunks_added = stats.chunks_added,
            chunks_skipped = stats.chunks_skipped,
            errors = stats.errors,
            "ingestion finished"
        );
        Ok(stats)
    }

    /// Chunk, dedup, embed and commit the text of one file.
    async fn ingest_text(&self, filename: &str, text: &str) -> Result<FileOutcome> {
        let mut outcome = FileOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: Vec<StoredRecord> = Vec::new();

        for chunk in self.chunker.split(text) {
            let digest = content_digest(&chunk);
            if !seen.insert(digest.clone()) || is_known(self.store.as_ref(), &digest).await? {
                outcome.skipped += 1;
                continue;
            }
            pending.push(StoredRecord {
                vector: self.embedder.embed(&chunk),
                digest,
                filename: filename.to_string(),
                content: chunk,
            });
        }

        if pending.is_empty() {
            return Ok(outcome);
        }

        // A concurrent run may have stored a digest since the check above.
        for result in self.store.insert_batch(&pending).await? {
            if result.is_inserted() {
                outcome.added += 1;
            } else {
                outcome.skipped += 1;
            }
        }
        Ok(outcome)
    }

    /// Top `limit` chunks nearest to `text`, best first.
    ///
    /// Blank text or a zero limit yields an empty list without touching the
    /// store.
    pub async fn query(&self, text: &str, limit: usize) -> Result<Vec<QueryHit>> {
        if text.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(text);
        let neighbors = self.store.nearest(&vector, limit).await?;
        Ok(rank(neighbors, self.snippet_chars))
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.aggregate_stats().await
    }
}
