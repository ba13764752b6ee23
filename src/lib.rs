//! # docvec
//!
//! Ingests a directory of documents into a vector store and answers
//! nearest-neighbor queries over it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌───────────┐   ┌────────────────────────┐   ┌──────────────┐
//! │ Walker  │──▶│ Extractor │──▶│ Chunk → Digest → Embed │──▶│ VectorStore  │
//! │ walkdir │   │ pdf/utf-8 │   │     (docvec-core)      │   │ SQLite/Weav. │
//! └─────────┘   └───────────┘   └────────────────────────┘   └──────┬───────┘
//!                                                                  │
//!                                         ┌────────────────────────┤
//!                                         ▼                        ▼
//!                                    ┌──────────┐            ┌──────────┐
//!                                    │   CLI    │            │   HTTP   │
//!                                    └──────────┘            └──────────┘
//! ```
//!
//! Vectors come from a deterministic hash-seeded generator, not a language
//! model: identical text always maps to the same vector, but similarity
//! between different texts carries no meaning.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`walker`] | Document discovery |
//! | [`extract`] | PDF and text extraction |
//! | [`pipeline`] | Ingestion orchestration and query path |
//! | [`backend`] | Store selection |
//! | [`sqlite_store`] | SQLite store |
//! | [`weaviate_store`] | Weaviate store |
//! | [`server`] | HTTP service |

pub mod backend;
pub mod config;
pub mod db;
pub mod extract;
pub mod ingest;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod walker;
pub mod weaviate_store;

pub use docvec_core::models::{IngestStats, QueryHit, StoreStats};
pub use docvec_core::store::VectorStore;
