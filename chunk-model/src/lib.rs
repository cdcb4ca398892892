//! Shared models used across crates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Origin of a source document, as produced by the external loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Pdf,
    Csv,
    Wikipedia,
    Web,
    Text,
}

impl Default for SourceKind {
    fn default() -> Self {
        SourceKind::Text
    }
}

/// Typed document metadata with a fixed set of well-known optional fields
/// plus an open extension map for source-specific fields.
///
/// Serializes flat: `extra` keys appear alongside the named fields, so a
/// chunk's metadata record is one flat object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    #[serde(default)]
    pub source_kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Row index for tabular sources (CSV).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    /// Paragraph index within the source, when the loader tracks it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<usize>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// One unit of raw source text plus its metadata. Immutable once produced;
/// identified by its position in the input sequence (`doc_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub text: String,
    pub meta: DocMeta,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>, meta: DocMeta) -> Self {
        Self { text: text.into(), meta }
    }
}

/// Per-chunk metadata: position plus the owning document's metadata,
/// merged flat so retrieval results never need a join back to the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Owning document (position in the input sequence).
    pub doc_id: usize,
    /// Zero-based position within the document's chunk sequence.
    pub chunk_id: usize,
    /// Exact tokenizer-measured token count of the chunk text.
    pub tokens: usize,
    #[serde(flatten)]
    pub source: DocMeta,
}

/// Which index produced a retrieval hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    Lexical,
    Vector,
}

impl RetrievalMethod {
    /// Stable wire tag for display and serialized output.
    pub fn tag(self) -> &'static str {
        match self {
            RetrievalMethod::Lexical => "bm25",
            RetrievalMethod::Vector => "vector",
        }
    }
}

/// One scored, metadata-annotated result. Constructed per query, not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub score: f32,
    pub text: String,
    pub meta: ChunkMeta,
    pub method: RetrievalMethod,
}
