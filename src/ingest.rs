//! `docvec ingest`: run the pipeline over a document root and print a summary.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Instant;

use docvec_core::models::IngestStats;

use crate::backend::open_store;
use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::progress::ProgressMode;

/// Ingest `doc_path` (or `[ingest].root`) into the configured store.
///
/// Store and root problems are returned as errors before any file is read.
pub async fn run_ingest(
    config: &Config,
    doc_path: Option<PathBuf>,
    progress: ProgressMode,
) -> Result<IngestStats> {
    let root = doc_path.unwrap_or_else(|| config.ingest.root.clone());
    let store = open_store(config).await?;
    let pipeline = Pipeline::from_config(config, store.clone())?;

    let started = Instant::now();
    let reporter = progress.reporter();
    let result = pipeline.ingest(&root, reporter.as_ref()).await;
    store.close().await;
    let stats = result?;

    println!("ingest {} ({})", root.display(), store.backend());
    println!("  files processed: {}", stats.files_processed);
    println!("  chunks added: {}", stats.chunks_added);
    println!("  chunks skipped: {}", stats.chunks_skipped);
    println!("  errors: {}", stats.errors);
    println!("  elapsed: {:.2}s", started.elapsed().as_secs_f64());
    println!("ok");

    Ok(stats)
}
