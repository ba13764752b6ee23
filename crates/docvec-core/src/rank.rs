//! Distance-to-score conversion and display truncation.

use crate::models::{Neighbor, QueryHit};

/// Display cap on returned content, in characters.
pub const DEFAULT_SNIPPET_CHARS: usize = 500;

/// Map a non-negative distance to a score in `(0, 1]`: `1 / (1 + d)`.
///
/// Negative inputs (not produced by any backend) are clamped to zero.
pub fn to_score(distance: f64) -> f64 {
    1.0 / (1.0 + distance.max(0.0))
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Convert store neighbors (already ordered by ascending distance) into hits.
pub fn rank(neighbors: Vec<Neighbor>, snippet_chars: usize) -> Vec<QueryHit> {
    neighbors
        .into_iter()
        .map(|n| QueryHit {
            score: to_score(n.distance),
            content: truncate_chars(&n.content, snippet_chars).to_string(),
            filename: n.filename,
        })
        .collect()
}
