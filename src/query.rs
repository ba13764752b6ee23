//! `docvec query`: print the nearest chunks for a query string.

use anyhow::Result;

use docvec_core::models::QueryHit;

use crate::backend::open_store;
use crate::config::Config;
use crate::pipeline::Pipeline;

pub async fn run_query(config: &Config, text: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let limit = limit.unwrap_or(config.retrieval.default_limit);
    let store = open_store(config).await?;
    let pipeline = Pipeline::from_config(config, store.clone())?;
    let result = pipeline.query(text, limit).await;
    store.close().await;
    let hits = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        print_hits(&hits);
    }
    Ok(())
}

fn print_hits(hits: &[QueryHit]) {
    if hits.is_empty() {
        println!("No results.");
        return;
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{:.4}] {}", i + 1, hit.score, hit.filename);
        for line in hit.content.lines().take(3) {
            println!("    {}", line);
        }
        println!();
    }
}
