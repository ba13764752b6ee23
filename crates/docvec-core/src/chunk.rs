//! Recursive-separator text chunker with character overlap.
//!
//! Splits extracted document text into chunks of at most `chunk_size`
//! characters, where every chunk after the first begins with the last
//! `chunk_overlap` characters of the chunk before it. Every chunk is a
//! contiguous span of the input, so boundaries are reproducible and the
//! content digest of each chunk is stable across runs.
//!
//! # Algorithm
//!
//! 1. Text that is empty or whitespace-only yields no chunks; text of at
//!    most `chunk_size` characters yields itself as the single chunk.
//! 2. Cut the text into pieces of at most `chunk_size - chunk_overlap`
//!    characters. Split on the first separator in [`SEPARATORS`] that
//!    occurs in the text (the separator stays attached to the end of its
//!    piece), recursing with the remaining separators on any piece that
//!    is still too long. With no separator left, cut at fixed character
//!    counts.
//! 3. Merge consecutive pieces greedily while the chunk stays within
//!    `chunk_size`. When the next piece does not fit, emit the chunk and
//!    start the next one from its last `chunk_overlap` characters.
//! 4. Drop whitespace-only chunks at the start and end of the sequence.
//!    Blank chunks between non-blank ones are kept.
//!
//! Lengths are counted in `char`s, never bytes.
//!
//! # Example
//!
//! ```rust
//! use docvec_core::chunk::Chunker;
//!
//! let chunker = Chunker::new(800, 200).unwrap();
//! let chunks = chunker.split("hello-world");
//! assert_eq!(chunks, vec!["hello-world".to_string()]);
//! assert!(chunker.split("").is_empty());
//! ```

use anyhow::{bail, Result};

/// Reference maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Reference overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separators in priority order: paragraphs, lines, sentence ends, words.
pub const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", "; ", " "];

/// Splits text into bounded, overlapping chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    /// Requires `chunk_size > 0` and `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            bail!("chunk_size must be > 0");
        }
        if chunk_overlap >= chunk_size {
            bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap,
                chunk_size
            );
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered chunks.
    ///
    /// # Guarantees
    ///
    /// - Every chunk has at most `chunk_size` characters.
    /// - Chunk `i > 0` starts with the last `chunk_overlap` characters of
    ///   chunk `i - 1`.
    /// - Identical input always produces identical chunks.
    /// - The first and last chunks contain non-whitespace characters.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut pieces = Vec::new();
        split_pieces(text, SEPARATORS, step, &mut pieces);

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut end = 0usize;
        let mut len = 0usize;
        let mut fresh = false;

        for piece in pieces {
            let piece_len = char_len(piece);
            if fresh && len + piece_len > self.chunk_size {
                chunks.push(&text[start..end]);
                let seed = self.chunk_overlap.min(len);
                start += tail_offset(&text[start..end], seed);
                len = seed;
                fresh = false;
            }
            end += piece.len();
            len += piece_len;
            fresh = true;
        }
        if fresh {
            chunks.push(&text[start..end]);
        }

        // Trim blank chunks at the ends only; inner ones carry the overlap.
        let is_blank = |c: &&str| c.trim().is_empty();
        let first = chunks.iter().position(|c| !is_blank(c)).unwrap_or(chunks.len());
        let last = chunks.iter().rposition(|c| !is_blank(c)).map_or(first, |i| i + 1);
        chunks[first..last].iter().map(|c| c.to_string()).collect()
    }
}

/// Cut `text` into consecutive pieces of at most `max` characters.
///
/// Concatenating the output reproduces `text` exactly.
fn split_pieces<'a>(text: &'a str, separators: &[&str], max: usize, out: &mut Vec<&'a str>) {
    if char_len(text) <= max {
        out.push(text);
        return;
    }

    let Some(pos) = separators.iter().position(|sep| text.contains(sep)) else {
        hard_split(text, max, out);
        return;
    };
    let remaining = &separators[pos + 1..];

    for part in text.split_inclusive(separators[pos]) {
        if char_len(part) <= max {
            out.push(part);
        } else {
            split_pieces(part, remaining, max, out);
        }
    }
}

/// Fixed-width split on character boundaries.
fn hard_split<'a>(text: &'a str, max: usize, out: &mut Vec<&'a str>) {
    let mut rest = text;
    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(max)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        out.push(&rest[..cut]);
        rest = &rest[cut..];
    }
}

/// Byte offset in `s` where its last `n` characters begin.
fn tail_offset(s: &str, n: usize) -> usize {
    if n == 0 {
        return s.len();
    }
    s.char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
