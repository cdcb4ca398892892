//! Index structures and their on-disk lifecycle: a BM25 lexical index, a
//! TF-IDF vectorizer with an HNSW nearest-neighbor index, and the artifact
//! directory both are persisted to.

pub mod artifacts;
pub mod lexical;
pub mod tfidf;
pub mod vector;

pub use artifacts::{ArtifactPaths, Manifest};
pub use lexical::Bm25Index;
pub use tfidf::TfidfVectorizer;
pub use vector::VectorIndex;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("corrupt index artifacts: {0}")]
    Corrupt(String),
}

/// Tokenize text into index terms.
///
/// Applies: lowercase, split on non-alphanumeric, drop empty fragments.
/// Single-character terms and digits are kept so queries like "mars 2"
/// stay searchable; noise words are the segmenter's stopword filter's
/// job, not the tokenizer's. Chunks at build time and queries at query
/// time must both go through this function; diverging pipelines degrade
/// relevance silently.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Convert a nearest-neighbor distance to a similarity comparable with
/// lexical scores. Monotonically decreasing in distance; the epsilon
/// guards division by zero at distance 0. This is a tunable scoring
/// policy, but it must stay identical between the vector query path and
/// any cross-method score comparison.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance + 1e-6)
}
