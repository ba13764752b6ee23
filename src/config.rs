//! TOML configuration parsing and validation.
//!
//! Every section has defaults, so an empty file (or [`Config::minimal`])
//! is a working SQLite setup. A handful of environment variables override
//! file values for container deployments; see [`apply_env_overrides`].
//!
//! ```toml
//! [store]
//! backend = "sqlite"          # sqlite | weaviate | memory
//! path = "./data/docvec.sqlite"
//! url = "http://localhost:8080"
//! collection = "Documents"
//! dims = 768
//!
//! [chunking]
//! chunk_size = 800
//! chunk_overlap = 200
//!
//! [ingest]
//! root = "/srv/docs"
//! extensions = ["pdf", "txt", "md"]
//!
//! [retrieval]
//! default_limit = 5
//! snippet_chars = 500
//!
//! [server]
//! bind = "0.0.0.0:8090"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use docvec_core::chunk::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use docvec_core::embedding::DEFAULT_DIMS;
use docvec_core::rank::DEFAULT_SNIPPET_CHARS;

/// Extensions ingested by the relational profile.
pub const BASIC_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];
/// Extensions ingested by the vector-database profile.
pub const EXTENDED_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "rst", "py", "js", "go", "sh"];

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Weaviate,
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Weaviate => "weaviate",
            Backend::Memory => "memory",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_weaviate_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: default_db_path(),
            url: default_weaviate_url(),
            collection: default_collection(),
            dims: default_dims(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/docvec.sqlite")
}
fn default_weaviate_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_collection() -> String {
    "Documents".to_string()
}
fn default_dims() -> usize {
    DEFAULT_DIMS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Lowercase extensions without the dot. `None` selects the profile
    /// matching the backend.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            extensions: None,
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("/srv/docs")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

fn default_limit() -> usize {
    5
}
fn default_snippet_chars() -> usize {
    DEFAULT_SNIPPET_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8090".to_string()
}

impl Config {
    /// All defaults, no file required.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Extensions to ingest: the configured list, or the backend's profile.
    pub fn extensions(&self) -> Vec<String> {
        match &self.ingest.extensions {
            Some(list) => list
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            None => {
                let profile = match self.store.backend {
                    Backend::Weaviate => EXTENDED_EXTENSIONS,
                    Backend::Sqlite | Backend::Memory => BASIC_EXTENSIONS,
                };
                profile.iter().map(|e| e.to_string()).collect()
            }
        }
    }

    /// Check invariants that would otherwise surface mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be > 0");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }
        if self.store.dims == 0 {
            bail!("store.dims must be > 0");
        }
        if self.retrieval.default_limit == 0 {
            bail!("retrieval.default_limit must be >= 1");
        }
        if self.retrieval.snippet_chars == 0 {
            bail!("retrieval.snippet_chars must be > 0");
        }
        if self.extensions().is_empty() {
            bail!("ingest.extensions must not be empty");
        }

        let collection = &self.store.collection;
        let valid_collection = collection
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
            && collection.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_collection {
            bail!(
                "store.collection '{}' must start with an uppercase letter and contain only [A-Za-z0-9_]",
                collection
            );
        }

        if self.store.backend == Backend::Weaviate
            && !(self.store.url.starts_with("http://") || self.store.url.starts_with("https://"))
        {
            bail!("store.url must be an http(s) URL, got '{}'", self.store.url);
        }

        Ok(())
    }
}

/// Apply deployment overrides from the environment.
///
/// | Variable | Field |
/// |----------|-------|
/// | `DOC_PATH` | `ingest.root` |
/// | `DOCVEC_DB` | `store.path` |
/// | `WEAVIATE_URL` | `store.url` |
/// | `API_PORT` | port of `server.bind` |
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

fn apply_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(root) = var("DOC_PATH") {
        config.ingest.root = PathBuf::from(root);
    }
    if let Some(path) = var("DOCVEC_DB") {
        config.store.path = PathBuf::from(path);
    }
    if let Some(url) = var("WEAVIATE_URL") {
        config.store.url = url;
    }
    if let Some(port) = var("API_PORT") {
        let port: u16 = port
            .parse()
            .with_context(|| format!("API_PORT is not a valid port: '{}'", port))?;
        let host = config
            .server
            .bind
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.bind = format!("{}:{}", host, port);
    }
    Ok(())
}

/// Read, parse, override from the environment, and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Parse TOML without touching the environment or validating.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_is_reference_profile() {
        let cfg = parse_config("").unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.store.backend, Backend::Sqlite);
        assert_eq!(cfg.store.dims, 768);
        assert_eq!(cfg.chunking.chunk_size, 800);
        assert_eq!(cfg.chunking.chunk_overlap, 200);
        assert_eq!(cfg.retrieval.default_limit, 5);
        assert_eq!(cfg.retrieval.snippet_chars, 500);
        assert_eq!(cfg.extensions(), vec!["pdf", "txt", "md"]);
    }

    #[test]
    fn weaviate_backend_uses_extended_profile() {
        let cfg = parse_config("[store]\nbackend = \"weaviate\"\n").unwrap();
        cfg.validate().unwrap();
        let ext = cfg.extensions();
        assert!(ext.contains(&"rst".to_string()));
        assert!(ext.contains(&"sh".to_string()));
        assert_eq!(ext.len(), 8);
    }

    #[test]
    fn explicit_extensions_are_normalized() {
        let cfg = parse_config("[ingest]\nextensions = [\".PDF\", \"txt\"]\n").unwrap();
        assert_eq!(cfg.extensions(), vec!["pdf", "txt"]);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let cfg = parse_config("[chunking]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(parse_config("[store]\nbackend = \"postgres\"\n").is_err());
    }

    #[test]
    fn rejects_lowercase_collection() {
        let cfg = parse_config("[store]\ncollection = \"documents\"\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_extension_list() {
        let cfg = parse_config("[ingest]\nextensions = []\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_overrides_replace_fields() {
        let vars: HashMap<&str, &str> = [
            ("DOC_PATH", "/data/docs"),
            ("WEAVIATE_URL", "http://weaviate:8080"),
            ("API_PORT", "9000"),
        ]
        .into_iter()
        .collect();
        let mut cfg = Config::minimal();
        apply_overrides(&mut cfg, |k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.ingest.root, PathBuf::from("/data/docs"));
        assert_eq!(cfg.store.url, "http://weaviate:8080");
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
    }

    #[test]
    fn bad_port_override_is_an_error() {
        let mut cfg = Config::minimal();
        let err = apply_overrides(&mut cfg, |k| (k == "API_PORT").then(|| "http".to_string()));
        assert!(err.is_err());
    }
}
