//! The persisted artifact set: ordered chunk corpus, positionally aligned
//! chunk metadata, both index structures, the fitted vectorizer, and a
//! build manifest used for corruption checks.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::IndexError;

pub const CORPUS_FILE: &str = "corpus.json";
pub const METADATA_FILE: &str = "metadata.json";
pub const LEXICAL_FILE: &str = "bm25.json";
pub const VECTORIZER_FILE: &str = "tfidf.json";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Locations of every artifact inside one index directory.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn corpus(&self) -> PathBuf {
        self.dir.join(CORPUS_FILE)
    }

    pub fn metadata(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    pub fn lexical(&self) -> PathBuf {
        self.dir.join(LEXICAL_FILE)
    }

    pub fn vectorizer(&self) -> PathBuf {
        self.dir.join(VECTORIZER_FILE)
    }

    pub fn vectors(&self) -> PathBuf {
        self.dir.join(VECTORS_FILE)
    }

    pub fn manifest(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Explicit existence check driving the build-or-skip decision.
    /// Build is a no-op when every artifact is already on disk.
    pub fn all_exist(&self) -> bool {
        [
            self.corpus(),
            self.metadata(),
            self.lexical(),
            self.vectorizer(),
            self.vectors(),
            self.manifest(),
        ]
        .iter()
        .all(|p| p.exists())
    }

    pub fn create_dir(&self) -> Result<(), IndexError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }
}

/// Build provenance written last, after every other artifact. Disagreement
/// between the manifest and the loaded artifacts is treated as corruption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub built_at: String,
    pub chunk_count: usize,
    pub vector_dim: usize,
    pub corpus_fingerprint: String,
}

impl Manifest {
    pub fn new(chunk_count: usize, vector_dim: usize, corpus_fingerprint: String) -> Self {
        Self {
            built_at: chrono::Utc::now().to_rfc3339(),
            chunk_count,
            vector_dim,
            corpus_fingerprint,
        }
    }
}

/// sha256 over the ordered chunk texts, with a length prefix per chunk so
/// concatenation ambiguity cannot produce the same fingerprint.
pub fn corpus_fingerprint(chunks: &[String]) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update((chunk.len() as u64).to_le_bytes());
        hasher.update(chunk.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Serialize to `<path>.tmp`, then rename into place.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IndexError> {
    let tmp = path.with_extension("json.tmp");
    let file = fs::File::create(&tmp)?;
    serde_json::to_writer(std::io::BufWriter::new(file), value)?;
    fs::rename(tmp, path)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, IndexError> {
    let file = fs::File::open(path)?;
    let value = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(value)
}
