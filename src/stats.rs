//! `docvec stats`: record counts for the configured store.

use anyhow::Result;

use crate::backend::open_store;
use crate::config::{Backend, Config};

pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let store = open_store(config).await?;
    let result = store.aggregate_stats().await;
    store.close().await;
    let stats = result?;

    if json {
        let body = serde_json::json!({
            "unique_files": stats.unique_files,
            "total_chunks": stats.total_chunks,
            "backend": store.backend(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("docvec store stats");
    println!("==================");
    println!();
    println!("  Backend:       {}", store.backend());
    match config.store.backend {
        Backend::Sqlite => println!("  Database:      {}", config.store.path.display()),
        Backend::Weaviate => println!(
            "  Collection:    {} @ {}",
            config.store.collection, config.store.url
        ),
        Backend::Memory => {}
    }
    println!("  Dimensions:    {}", store.dims());
    println!();
    println!("  Unique files:  {}", stats.unique_files);
    println!("  Total chunks:  {}", stats.total_chunks);

    Ok(())
}
