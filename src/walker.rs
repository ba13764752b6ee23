//! Document discovery under an ingestion root.
//!
//! Walks the root recursively in file-name order and yields regular files
//! whose extension is in the configured set. Unreadable entries and
//! directories are skipped silently; only a missing or non-directory root
//! is an error.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use docvec_core::models::DocumentKind;

use crate::config::Config;

/// Paths never worth ingesting, relative to the root.
const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

/// An eligible file found by [`DocumentWalker::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub path: PathBuf,
    /// Lowercase extension without the dot.
    pub extension: String,
    pub kind: DocumentKind,
}

pub struct DocumentWalker {
    extensions: HashSet<String>,
    exclude_set: GlobSet,
    follow_symlinks: bool,
}

impl DocumentWalker {
    pub fn new(
        extensions: &[String],
        exclude_globs: &[String],
        follow_symlinks: bool,
    ) -> Result<Self> {
        let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        excludes.extend(exclude_globs.iter().cloned());

        Ok(Self {
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            exclude_set: build_globset(&excludes)?,
            follow_symlinks,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.extensions(),
            &config.ingest.exclude_globs,
            config.ingest.follow_symlinks,
        )
    }

    /// Lazily enumerate eligible files under `root`.
    pub fn walk<'a>(&'a self, root: &Path) -> Result<impl Iterator<Item = DocumentFile> + 'a> {
        if !root.exists() {
            bail!("Document root does not exist: {}", root.display());
        }
        if !root.is_dir() {
            bail!("Document root is not a directory: {}", root.display());
        }

        let root = root.to_path_buf();
        let walker = WalkDir::new(&root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();

        Ok(walker
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| {
                let path = entry.into_path();
                let relative = path.strip_prefix(&root).unwrap_or(&path);
                if self.exclude_set.is_match(relative) {
                    return None;
                }
                let extension = path.extension()?.to_str()?.to_ascii_lowercase();
                if !self.extensions.contains(&extension) {
                    return None;
                }
                Some(DocumentFile {
                    kind: DocumentKind::from_extension(&extension),
                    path,
                    extension,
                })
            }))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
