//! Vectorizer trait and the deterministic hash-seeded embedder.
//!
//! [`HashEmbedder`] is a stand-in, not a model: it seeds a Mersenne
//! Twister from the SHA-256 of the text and draws uniform values in
//! `[-1.0, 1.0]`. Identical text always yields the identical vector, but
//! similarity between two different texts carries no meaning beyond
//! hash-seed coincidence.
//!
//! # Algorithm
//!
//! 1. `SHA-256(text.as_bytes())`.
//! 2. First 8 digest bytes as a big-endian `u64` seed.
//! 3. Seed [`MersenneTwister`] and draw `dims` values with
//!    `uniform(-1.0, 1.0)`.
//! 4. Narrow each `f64` to `f32` (the precision every store keeps).
//!
//! # Example
//!
//! ```rust
//! use docvec_core::embedding::{Embedder, HashEmbedder};
//!
//! let embedder = HashEmbedder::default();
//! let a = embedder.embed("hello-world");
//! assert_eq!(a.len(), 768);
//! assert_eq!(a, embedder.embed("hello-world"));
//! ```

mod mersenne;

pub use mersenne::MersenneTwister;

use sha2::{Digest, Sha256};

/// Reference embedding dimensionality.
pub const DEFAULT_DIMS: usize = 768;

/// Anything that turns text into a fixed-length vector.
///
/// Chunks and queries must go through the same implementation.
pub trait Embedder: Send + Sync {
    /// Short identifier used in logs and health output.
    fn model_name(&self) -> &str;
    /// Length of every vector returned by [`embed`](Embedder::embed).
    fn dims(&self) -> usize;
    /// Vectorize `text`.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Deterministic pseudo-embedding keyed on the SHA-256 of the text.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    /// The `u64` seed for `text`: the first 8 bytes of its SHA-256, big-endian.
    pub fn seed_for(text: &str) -> u64 {
        let digest = Sha256::digest(text.as_bytes());
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(seed)
    }

    /// Full-precision draws, before narrowing to `f32`.
    pub fn embed_f64(&self, text: &str) -> Vec<f64> {
        let mut rng = MersenneTwister::from_seed(Self::seed_for(text));
        (0..self.dims).map(|_| rng.uniform(-1.0, 1.0)).collect()
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMS)
    }
}

impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "sha256-mt19937"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        self.embed_f64(text).into_iter().map(|v| v as f32).collect()
    }
}

/// Encode a float vector as little-endian `f32` bytes.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode bytes written by [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Euclidean distance between two vectors, accumulated in `f64`.
///
/// Returns `f64::INFINITY` for vectors of different lengths so they sort last.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
