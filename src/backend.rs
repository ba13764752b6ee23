//! Construct the configured [`VectorStore`].

use anyhow::{Context, Result};
use std::sync::Arc;

use docvec_core::store::memory::InMemoryStore;
use docvec_core::store::VectorStore;

use crate::config::{Backend, Config};
use crate::sqlite_store::SqliteStore;
use crate::weaviate_store::WeaviateStore;

/// Open the store named by `[store].backend` and ensure its schema exists.
///
/// Fails before any ingestion work if the store is unreachable or was
/// created with a different vector dimension.
pub async fn open_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match config.store.backend {
        Backend::Sqlite => Arc::new(SqliteStore::open(&config.store.path, config.store.dims).await?),
        Backend::Weaviate => Arc::new(WeaviateStore::new(
            &config.store.url,
            &config.store.collection,
            config.store.dims,
        )?),
        Backend::Memory => Arc::new(InMemoryStore::new(config.store.dims)),
    };

    store
        .ensure_schema()
        .await
        .with_context(|| format!("Failed to initialise {} store", config.store.backend.as_str()))?;

    tracing::debug!(backend = store.backend(), dims = store.dims(), "store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn opens_sqlite_by_default() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::minimal();
        config.store.path = tmp.path().join("docvec.sqlite");
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.backend(), "sqlite");
        assert_eq!(store.dims(), 768);
        store.close().await;
    }

    #[tokio::test]
    async fn opens_memory_backend() {
        let mut config = Config::minimal();
        config.store.backend = Backend::Memory;
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.backend(), "memory");
    }

    #[tokio::test]
    async fn unreachable_weaviate_fails_early() {
        let mut config = Config::minimal();
        config.store.backend = Backend::Weaviate;
        config.store.url = "http://127.0.0.1:9".to_string();
        let err = open_store(&config).await.err().unwrap();
        assert!(err.to_string().contains("weaviate store"), "{}", err);
    }
}
