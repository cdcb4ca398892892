//! The query-facing hybrid retrieval engine.
//!
//! Owns the build-or-load lifecycle of the index artifacts and exposes the
//! single contract the prompting layer depends on: a raw query string and
//! a result count in, an ordered list of retrieval hits out.

pub mod fusion;

use std::path::PathBuf;

use chunk_model::{ChunkMeta, RetrievalHit, RetrievalMethod, SourceDocument};
use doc_segmenter::{Segmenter, SegmenterConfig, SegmenterError};
use index_store::{
    artifacts, similarity_from_distance, ArtifactPaths, Bm25Index, IndexError, Manifest,
    TfidfVectorizer, VectorIndex,
};
use tracing::{debug, info};

pub use fusion::{best_of, merge_and_rerank, BestRetrieval};

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("segmenter error: {0}")]
    Segmenter(#[from] SegmenterError),
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    #[error("index artifacts missing under {0}; run a build first")]
    MissingArtifacts(PathBuf),
    #[error("no documents survived segmentation; nothing to index")]
    EmptyCorpus,
}

/// Engine configuration. `k` is the default result count for callers that
/// do not pass one.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub index_dir: PathBuf,
    pub segmenter: SegmenterConfig,
    pub k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("index"),
            segmenter: SegmenterConfig::default(),
            k: 4,
        }
    }
}

/// What a build invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built { chunks: usize },
    /// All artifacts were already on disk; the build was a no-op.
    SkippedExisting,
}

/// Build the full artifact set from raw documents, unless it already
/// exists. Idempotent and re-entrant by the existence check only;
/// concurrent builds from multiple processes must be serialized by the
/// caller.
pub fn build_index(
    config: &RetrieverConfig,
    documents: &[SourceDocument],
) -> Result<BuildOutcome, RetrievalError> {
    let paths = ArtifactPaths::new(&config.index_dir);
    if paths.all_exist() {
        info!(dir = %config.index_dir.display(), "index artifacts already exist, skipping build");
        return Ok(BuildOutcome::SkippedExisting);
    }
    paths.create_dir()?;

    let segmenter = Segmenter::new(config.segmenter)?;
    let (chunks, metadata) = segmenter.segment(documents);
    if chunks.is_empty() {
        return Err(RetrievalError::EmptyCorpus);
    }
    info!(documents = documents.len(), chunks = chunks.len(), "segmented corpus");

    // Both indexes consume the same ordered chunk list; chunk position is
    // the join key between text, metadata, and index rows.
    let bm25 = Bm25Index::build(&chunks);
    let tfidf = TfidfVectorizer::fit(&chunks);
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| tfidf.transform(c)).collect();
    let vector_index = VectorIndex::build(vectors)?;
    info!(dim = tfidf.dimension(), "built lexical and vector indexes");

    artifacts::save_json(&paths.corpus(), &chunks)?;
    artifacts::save_json(&paths.metadata(), &metadata)?;
    artifacts::save_json(&paths.lexical(), &bm25)?;
    artifacts::save_json(&paths.vectorizer(), &tfidf)?;
    vector_index.save(paths.vectors())?;
    // Manifest last: its presence marks a complete artifact set.
    let manifest = Manifest::new(
        chunks.len(),
        tfidf.dimension(),
        artifacts::corpus_fingerprint(&chunks),
    );
    artifacts::save_json(&paths.manifest(), &manifest)?;
    info!(dir = %config.index_dir.display(), "persisted index artifacts");

    Ok(BuildOutcome::Built { chunks: chunks.len() })
}

/// The loaded engine: every artifact resident in memory, queried many
/// times, never mutated. Construct once at process start and pass by
/// reference; queries take `&self` and are safe to run from multiple
/// threads.
pub struct HybridRetriever {
    config: RetrieverConfig,
    segmenter: Segmenter,
    corpus: Vec<String>,
    metadata: Vec<ChunkMeta>,
    bm25: Bm25Index,
    tfidf: TfidfVectorizer,
    vector_index: VectorIndex,
}

impl HybridRetriever {
    /// Load all artifacts from disk, validating positional alignment and
    /// dimension agreement. Fails when artifacts are missing or corrupt;
    /// there is no partial recovery here - rebuilding is the caller's path.
    pub fn load(config: RetrieverConfig) -> Result<Self, RetrievalError> {
        let paths = ArtifactPaths::new(&config.index_dir);
        if !paths.all_exist() {
            return Err(RetrievalError::MissingArtifacts(config.index_dir.clone()));
        }

        let corpus: Vec<String> = artifacts::load_json(&paths.corpus())?;
        let metadata: Vec<ChunkMeta> = artifacts::load_json(&paths.metadata())?;
        let bm25: Bm25Index = artifacts::load_json(&paths.lexical())?;
        let tfidf: TfidfVectorizer = artifacts::load_json(&paths.vectorizer())?;
        let vector_index = VectorIndex::load(paths.vectors())?;
        let manifest: Manifest = artifacts::load_json(&paths.manifest())?;

        validate_artifacts(&corpus, &metadata, &bm25, &tfidf, &vector_index, &manifest)?;
        let segmenter = Segmenter::new(config.segmenter)?;
        info!(
            dir = %config.index_dir.display(),
            chunks = corpus.len(),
            dim = tfidf.dimension(),
            built_at = %manifest.built_at,
            "loaded index artifacts"
        );

        Ok(Self { config, segmenter, corpus, metadata, bm25, tfidf, vector_index })
    }

    /// Build on first use, then load. The documents closure runs only when
    /// the artifacts are not already on disk.
    pub fn open_or_build<F>(config: RetrieverConfig, documents: F) -> Result<Self, RetrievalError>
    where
        F: FnOnce() -> Vec<SourceDocument>,
    {
        let paths = ArtifactPaths::new(&config.index_dir);
        if !paths.all_exist() {
            let docs = documents();
            build_index(&config, &docs)?;
        }
        Self::load(config)
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn chunk_count(&self) -> usize {
        self.corpus.len()
    }

    /// Top-k lexical hits for a raw query. An empty or stopword-only query
    /// returns no hits rather than an error.
    pub fn query_lexical(&self, query: &str, k: usize) -> Vec<RetrievalHit> {
        let cleaned = self.segmenter.clean_query(query);
        if cleaned.is_empty() {
            debug!("query cleaned to empty string, returning no lexical hits");
            return Vec::new();
        }
        self.bm25
            .query(&cleaned, k)
            .into_iter()
            .map(|(pos, score)| self.hit(pos, score, RetrievalMethod::Lexical))
            .collect()
    }

    /// Top-k vector hits for a raw query, scored on the shared similarity
    /// scale. A query with no in-vocabulary terms returns no hits.
    pub fn query_vector(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>, RetrievalError> {
        let cleaned = self.segmenter.clean_query(query);
        if cleaned.is_empty() {
            debug!("query cleaned to empty string, returning no vector hits");
            return Ok(Vec::new());
        }
        let qvec = self.tfidf.transform(&cleaned);
        if qvec.iter().all(|&x| x == 0.0) {
            debug!("query has no in-vocabulary terms, returning no vector hits");
            return Ok(Vec::new());
        }
        let hits = self.vector_index.search(&qvec, k)?;
        Ok(hits
            .into_iter()
            .map(|(pos, dist)| self.hit(pos, similarity_from_distance(dist), RetrievalMethod::Vector))
            .collect())
    }

    /// Merge-and-rerank fusion: top-k from each index, concatenated,
    /// sorted by score descending, truncated to `k`. Duplicate chunks
    /// surfaced by both methods are kept.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalHit>, RetrievalError> {
        let lexical = self.query_lexical(query, k);
        let vector = self.query_vector(query, k)?;
        debug!(lexical = lexical.len(), vector = vector.len(), "fusing ranked hits");
        Ok(merge_and_rerank(lexical, vector, k))
    }

    /// Best-of fusion: the single top hit from each index compared on the
    /// shared similarity scale, tagged with the winning method. `None`
    /// when neither index returns a hit.
    pub fn retrieve_best(&self, query: &str) -> Result<Option<BestRetrieval>, RetrievalError> {
        let lexical = self.query_lexical(query, 1).into_iter().next();
        let vector = self.query_vector(query, 1)?.into_iter().next();
        Ok(best_of(lexical, vector))
    }

    fn hit(&self, pos: usize, score: f32, method: RetrievalMethod) -> RetrievalHit {
        RetrievalHit {
            score,
            text: self.corpus[pos].clone(),
            meta: self.metadata[pos].clone(),
            method,
        }
    }
}

fn validate_artifacts(
    corpus: &[String],
    metadata: &[ChunkMeta],
    bm25: &Bm25Index,
    tfidf: &TfidfVectorizer,
    vector_index: &VectorIndex,
    manifest: &Manifest,
) -> Result<(), RetrievalError> {
    let n = corpus.len();
    if metadata.len() != n || bm25.len() != n || vector_index.len() != n || manifest.chunk_count != n {
        return Err(IndexError::Corrupt(format!(
            "artifact sizes disagree: corpus {n}, metadata {}, lexical {}, vectors {}, manifest {}",
            metadata.len(),
            bm25.len(),
            vector_index.len(),
            manifest.chunk_count
        ))
        .into());
    }
    if tfidf.dimension() != vector_index.dimension() {
        return Err(IndexError::DimensionMismatch {
            expected: vector_index.dimension(),
            got: tfidf.dimension(),
        }
        .into());
    }
    if manifest.vector_dim != vector_index.dimension() {
        return Err(IndexError::Corrupt(format!(
            "manifest records dimension {}, vector index has {}",
            manifest.vector_dim,
            vector_index.dimension()
        ))
        .into());
    }
    let fingerprint = artifacts::corpus_fingerprint(corpus);
    if fingerprint != manifest.corpus_fingerprint {
        return Err(IndexError::Corrupt(
            "corpus fingerprint differs from manifest; artifacts are from mixed builds".into(),
        )
        .into());
    }
    Ok(())
}
