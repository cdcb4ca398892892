//! Token-budgeted document segmentation.
//!
//! Cleans raw document text and splits it into overlapping chunks whose
//! exact BPE token count never exceeds the configured budget, attaching
//! flattened per-chunk provenance metadata.

pub mod normalize;

use chunk_model::{ChunkMeta, SourceDocument};
use tiktoken_rs::CoreBPE;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum SegmenterError {
    #[error("invalid segmenter config: overlap {overlap} must be < max_tokens {max_tokens} (and max_tokens > 0)")]
    InvalidConfig { max_tokens: usize, overlap: usize },
    #[error("tokenizer init failed: {0}")]
    Tokenizer(String),
}

/// Chunking parameters. `overlap` words are shared between adjacent chunks;
/// higher overlap trades index size for less risk of splitting a fact
/// across a chunk boundary.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct SegmenterConfig {
    pub max_tokens: usize,
    pub overlap: usize,
    pub remove_stopwords: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self { max_tokens: 128, overlap: 32, remove_stopwords: true }
    }
}

impl SegmenterConfig {
    /// Validating constructor. `overlap >= max_tokens` would make the
    /// window advance non-terminating and is rejected here, not at runtime.
    pub fn new(max_tokens: usize, overlap: usize, remove_stopwords: bool) -> Result<Self, SegmenterError> {
        if max_tokens == 0 || overlap >= max_tokens {
            return Err(SegmenterError::InvalidConfig { max_tokens, overlap });
        }
        Ok(Self { max_tokens, overlap, remove_stopwords })
    }
}

/// Splits cleaned documents into overlapping, token-budgeted chunks.
/// Token counts come from the cl100k_base BPE so chunks stay within the
/// downstream model's accounting, which can diverge from a word count.
pub struct Segmenter {
    config: SegmenterConfig,
    bpe: CoreBPE,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Result<Self, SegmenterError> {
        // Re-validate in case the struct was built literally.
        let config = SegmenterConfig::new(config.max_tokens, config.overlap, config.remove_stopwords)?;
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| SegmenterError::Tokenizer(e.to_string()))?;
        Ok(Self { config, bpe })
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Exact token count of a text under the chunking tokenizer.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Clean a query string with the same pipeline applied to documents.
    pub fn clean_query(&self, query: &str) -> String {
        normalize::clean_text(query, self.config.remove_stopwords)
    }

    /// Clean and chunk every document, producing the ordered chunk corpus
    /// and its positionally aligned metadata. Documents that clean to
    /// nothing are skipped with a warning; the build continues.
    pub fn segment(&self, documents: &[SourceDocument]) -> (Vec<String>, Vec<ChunkMeta>) {
        let mut chunks = Vec::new();
        let mut metadata = Vec::new();

        for (doc_id, doc) in documents.iter().enumerate() {
            let cleaned = normalize::clean_text(&doc.text, self.config.remove_stopwords);
            if cleaned.is_empty() {
                warn!(doc_id, "document cleaned to empty text, skipping");
                continue;
            }
            for (chunk_id, text) in self.chunk_words(&cleaned).into_iter().enumerate() {
                let tokens = self.count_tokens(&text);
                metadata.push(ChunkMeta {
                    doc_id,
                    chunk_id,
                    tokens,
                    source: doc.meta.clone(),
                });
                chunks.push(text);
            }
        }

        (chunks, metadata)
    }

    /// Sliding-window chunking over the word sequence. Each window starts
    /// at `max_tokens` words, then trailing words are trimmed one at a
    /// time until the measured token count fits the budget. A lone word
    /// that still exceeds the budget is dropped, never emitted over budget.
    fn chunk_words(&self, cleaned: &str) -> Vec<String> {
        let words: Vec<&str> = cleaned.split_whitespace().collect();
        let mut out = Vec::new();
        let step = self.config.max_tokens - self.config.overlap;

        let mut start = 0usize;
        while start < words.len() {
            let end = (start + self.config.max_tokens).min(words.len());
            let mut window = &words[start..end];
            let mut text = window.join(" ");
            while window.len() > 1 && self.count_tokens(&text) > self.config.max_tokens {
                window = &window[..window.len() - 1];
                text = window.join(" ");
            }
            if self.count_tokens(&text) > self.config.max_tokens {
                warn!(word = window[0], "single word exceeds the chunk token budget, skipping");
            } else {
                out.push(text);
            }
            start += step;
        }
        out
    }
}
