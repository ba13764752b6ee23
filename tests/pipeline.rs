//! Ingestion and query behavior through the library, against the SQLite
//! and in-memory stores.

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use docvec::config::{Backend, Config};
use docvec::pipeline::Pipeline;
use docvec::progress::NoProgress;
use docvec::sqlite_store::SqliteStore;
use docvec::{IngestStats, StoreStats, VectorStore};
use docvec_core::digest::content_digest;
use docvec_core::models::{Neighbor, StoredRecord};
use docvec_core::store::memory::InMemoryStore;
use docvec_core::store::InsertOutcome;

fn write_corpus(dir: &Path) {
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(
        dir.join("alpha.md"),
        "# Alpha\n\nThe alpha document is about Rust programming.\n\nIt mentions cargo and crates.",
    )
    .unwrap();
    fs::write(
        dir.join("nested/gamma.txt"),
        "Gamma notes about deployment and infrastructure.",
    )
    .unwrap();
    let long: String = (0..40)
        .map(|i| format!("Paragraph {} talks about topic number {} in some detail.\n\n", i, i))
        .collect();
    fs::write(dir.join("long.md"), long).unwrap();
    fs::write(dir.join("ignored.png"), [0u8, 1, 2]).unwrap();
}

async fn sqlite_pipeline(tmp: &TempDir) -> Pipeline {
    let mut config = Config::minimal();
    config.store.path = tmp.path().join("data/docvec.sqlite");
    let store = SqliteStore::open(&config.store.path, config.store.dims)
        .await
        .unwrap();
    store.ensure_schema().await.unwrap();
    Pipeline::from_config(&config, Arc::new(store)).unwrap()
}

fn memory_pipeline() -> Pipeline {
    pipeline_over(Arc::new(InMemoryStore::default()))
}

fn pipeline_over(store: Arc<dyn VectorStore>) -> Pipeline {
    let mut config = Config::minimal();
    config.store.backend = Backend::Memory;
    Pipeline::from_config(&config, store).unwrap()
}

/// Wraps a memory store. `fail_next_batch` makes the next `insert_batch`
/// fail without writing; `hide_existing` makes `exists` always answer
/// false, as if another writer stored the digest after the check.
struct WrappedStore {
    inner: Arc<InMemoryStore>,
    fail_next_batch: AtomicBool,
    hide_existing: bool,
}

impl WrappedStore {
    fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            fail_next_batch: AtomicBool::new(false),
            hide_existing: false,
        }
    }
}

#[async_trait]
impl VectorStore for WrappedStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn dims(&self) -> usize {
        self.inner.dims()
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.inner.ensure_schema().await
    }

    async fn exists(&self, digest: &str) -> Result<bool> {
        if self.hide_existing {
            return Ok(false);
        }
        self.inner.exists(digest).await
    }

    async fn insert_batch(&self, records: &[StoredRecord]) -> Result<Vec<InsertOutcome>> {
        if self.fail_next_batch.swap(false, Ordering::SeqCst) {
            anyhow::bail!("connection reset");
        }
        self.inner.insert_batch(records).await
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.inner.nearest(query, k).await
    }

    async fn aggregate_stats(&self) -> Result<StoreStats> {
        self.inner.aggregate_stats().await
    }
}

#[tokio::test]
async fn second_run_is_idempotent_sqlite() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    write_corpus(&docs);
    let pipeline = sqlite_pipeline(&tmp).await;

    let first = pipeline.ingest(&docs, &NoProgress).await.unwrap();
    assert_eq!(first.files_processed, 3);
    assert_eq!(first.errors, 0);
    assert!(first.chunks_added >= 4, "long.md should chunk: {:?}", first);
    let before = pipeline.stats().await.unwrap();

    let second = pipeline.ingest(&docs, &NoProgress).await.unwrap();
    assert_eq!(second.chunks_added, 0);
    assert_eq!(second.chunks_skipped, first.chunks_added + first.chunks_skipped);
    assert_eq!(pipeline.stats().await.unwrap(), before);
    assert_eq!(before.unique_files, 3);
    assert_eq!(before.total_chunks, first.chunks_added);
}

#[tokio::test]
async fn hello_world_file_sqlite() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("hello.txt"), "hello-world").unwrap();
    let pipeline = sqlite_pipeline(&tmp).await;

    let stats = pipeline.ingest(&docs, &NoProgress).await.unwrap();
    assert_eq!(
        stats,
        IngestStats {
            files_processed: 1,
            chunks_added: 1,
            chunks_skipped: 0,
            errors: 0,
        }
    );
    let store_stats = pipeline.stats().await.unwrap();
    assert_eq!(store_stats.total_chunks, 1);
    assert_eq!(store_stats.unique_files, 1);
}

#[tokio::test]
async fn corrupt_pdf_counts_an_error_and_run_completes() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("broken.pdf"), b"this is not a pdf").unwrap();
    let pipeline = sqlite_pipeline(&tmp).await;

    let stats = pipeline.ingest(&docs, &NoProgress).await.unwrap();
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.chunks_added, 0);
    assert_eq!(stats.files_processed, 0);
}

#[tokio::test]
async fn corrupt_pdf_does_not_stop_other_files() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("a_broken.pdf"), b"%PDF-1.4 junk").unwrap();
    fs::write(docs.join("b_good.md"), "good content").unwrap();
    let pipeline = memory_pipeline();

    let stats = pipeline.ingest(&docs, &NoProgress).await.unwrap();
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.chunks_added, 1);
}

#[tokio::test]
async fn query_against_empty_store_is_empty() {
    let tmp = TempDir::new().unwrap();
    let pipeline = sqlite_pipeline(&tmp).await;
    assert!(pipeline.query("anything at all", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn identical_text_in_two_files_is_stored_once() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("one.md"), "shared paragraph").unwrap();
    fs::write(docs.join("two.txt"), "shared paragraph").unwrap();
    let pipeline = sqlite_pipeline(&tmp).await;

    let stats = pipeline.ingest(&docs, &NoProgress).await.unwrap();
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.chunks_added, 1);
    assert_eq!(stats.chunks_skipped, 1);

    let hits = pipeline.query("shared paragraph", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].filename.ends_with("one.md"));
}

#[tokio::test]
async fn stored_chunk_ranks_first_with_score_one() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    write_corpus(&docs);

    for pipeline in [sqlite_pipeline(&tmp).await, memory_pipeline()] {
        pipeline.ingest(&docs, &NoProgress).await.unwrap();
        let text = "Gamma notes about deployment and infrastructure.";
        let hits = pipeline.query(text, 5).await.unwrap();

        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].content, text);
        assert_eq!(hits[0].score, 1.0);
        assert!(hits[0].filename.ends_with("gamma.txt"));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(hits.iter().all(|h| h.score > 0.0 && h.score <= 1.0));
    }
}

#[tokio::test]
async fn query_content_is_capped_at_500_chars() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    let body = "w".repeat(750);
    fs::write(docs.join("wide.txt"), &body).unwrap();
    let pipeline = memory_pipeline();
    pipeline.ingest(&docs, &NoProgress).await.unwrap();

    let hits = pipeline.query(&body, 1).await.unwrap();
    assert_eq!(hits[0].score, 1.0);
    assert_eq!(hits[0].content.chars().count(), 500);
}

#[tokio::test]
async fn missing_root_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let pipeline = memory_pipeline();
    let err = pipeline
        .ingest(&tmp.path().join("nope"), &NoProgress)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn failed_write_counts_one_error_and_next_run_recovers() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("a.md"), "first file body").unwrap();
    fs::write(docs.join("b.md"), "second file body").unwrap();

    let inner = Arc::new(InMemoryStore::default());
    let store = Arc::new(WrappedStore::new(inner.clone()));
    store.fail_next_batch.store(true, Ordering::SeqCst);
    let pipeline = pipeline_over(store);

    let first = pipeline.ingest(&docs, &NoProgress).await.unwrap();
    assert_eq!(
        first,
        IngestStats {
            files_processed: 2,
            chunks_added: 1,
            chunks_skipped: 0,
            errors: 1,
        }
    );
    assert_eq!(inner.len(), 1);

    let second = pipeline.ingest(&docs, &NoProgress).await.unwrap();
    assert_eq!(
        second,
        IngestStats {
            files_processed: 2,
            chunks_added: 1,
            chunks_skipped: 1,
            errors: 0,
        }
    );
    assert_eq!(inner.len(), 2);
}

#[tokio::test]
async fn digest_stored_after_check_counts_as_skipped() {
    let tmp = TempDir::new().unwrap();
    let docs = tmp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    let text = "written by another process";
    fs::write(docs.join("late.md"), text).unwrap();

    let inner = Arc::new(InMemoryStore::default());
    inner
        .insert(&StoredRecord {
            digest: content_digest(text),
            filename: "elsewhere.md".to_string(),
            content: text.to_string(),
            vector: vec![0.0; inner.dims()],
        })
        .await
        .unwrap();
    let mut store = WrappedStore::new(inner.clone());
    store.hide_existing = true;
    let pipeline = pipeline_over(Arc::new(store));

    let stats = pipeline.ingest(&docs, &NoProgress).await.unwrap();
    assert_eq!(
        stats,
        IngestStats {
            files_processed: 1,
            chunks_added: 0,
            chunks_skipped: 1,
            errors: 0,
        }
    );
    assert_eq!(inner.len(), 1);
}
