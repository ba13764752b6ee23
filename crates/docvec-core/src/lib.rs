//! # docvec core
//!
//! Storage-agnostic logic for docvec: data models, the overlapping text
//! chunker, content digests, the deterministic vectorizer, score ranking,
//! and the [`VectorStore`](store::VectorStore) abstraction with an
//! in-memory implementation.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Concrete
//! backends (SQLite, Weaviate) and the ingestion pipeline live in the
//! `docvec` application crate.

pub mod chunk;
pub mod digest;
pub mod embedding;
pub mod models;
pub mod rank;
pub mod store;
