//! HNSW-based nearest-neighbor index over one vector per chunk (Euclidean
//! distance). Persists by snapshotting the raw vectors; the graph is
//! rebuilt on load. Insertion label = chunk position, so results join back
//! to the corpus and metadata by array index.

use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use hnsw_rs::prelude::*;
use tracing::debug;

use crate::IndexError;

const MAX_NB_CONN: usize = 16;
const NB_LAYERS: usize = 16;
const EF_CONSTRUCTION: usize = 200;
/// Search breadth multiplier over the requested k.
const EF_SEARCH_FACTOR: usize = 10;

pub struct VectorIndex {
    dim: usize,
    hnsw: Hnsw<'static, f32, DistL2>,
    /// Stored vectors for persistence and rebuild.
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Build from one vector per chunk, in corpus order. All vectors must
    /// share one dimensionality.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dim = match vectors.first() {
            Some(v) => v.len(),
            None => return Err(IndexError::Corrupt("cannot build vector index over empty corpus".into())),
        };
        if dim == 0 {
            return Err(IndexError::Corrupt("zero-dimensional vectors".into()));
        }
        for v in &vectors {
            if v.len() != dim {
                return Err(IndexError::DimensionMismatch { expected: dim, got: v.len() });
            }
        }
        Ok(Self::from_vectors(vectors, dim))
    }

    fn from_vectors(vectors: Vec<Vec<f32>>, dim: usize) -> Self {
        let expected = vectors.len().max(1000);
        let hnsw = Hnsw::<f32, DistL2>::new(MAX_NB_CONN, expected, NB_LAYERS, EF_CONSTRUCTION, DistL2 {});
        for (label, v) in vectors.iter().enumerate() {
            hnsw.insert((&v[..], label));
        }
        Self { dim, hnsw, vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// k-nearest-neighbor search. Returns `(chunk position, distance)` in
    /// ascending distance order. A query of the wrong dimensionality is a
    /// configuration error, never truncated or padded.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch { expected: self.dim, got: query.len() });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let ef = (top_k * EF_SEARCH_FACTOR).max(EF_CONSTRUCTION);
        let neighbours = self.hnsw.search(query, top_k.min(self.len()), ef);
        Ok(neighbours
            .into_iter()
            .map(|n| (n.d_id, n.distance))
            .collect())
    }

    /// Snapshot the vectors to disk as `[u32 dim][f32 ..]` rows,
    /// little-endian, written to a temp file then renamed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), IndexError> {
        let path = path.as_ref();
        let tmp = path.with_extension("bin.tmp");
        {
            let mut w = BufWriter::new(fs::File::create(&tmp)?);
            for v in &self.vectors {
                let dim = v.len() as u32;
                w.write_all(&dim.to_le_bytes())?;
                let bytes: &[u8] = bytemuck::cast_slice(&v[..]);
                w.write_all(bytes)?;
            }
            w.flush()?;
        }
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Load a snapshot and rebuild the graph. Rows with inconsistent
    /// dimensions mean the artifact is corrupt.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let mut r = BufReader::new(fs::File::open(path.as_ref())?);
        let mut vectors: Vec<Vec<f32>> = Vec::new();
        let mut dim: Option<usize> = None;
        loop {
            let mut len_buf = [0u8; 4];
            match r.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let l = u32::from_le_bytes(len_buf) as usize;
            match dim {
                None => dim = Some(l),
                Some(d) if d != l => {
                    return Err(IndexError::Corrupt(format!(
                        "vector row {} has dimension {l}, expected {d}",
                        vectors.len()
                    )))
                }
                Some(_) => {}
            }
            let mut vbytes = vec![0u8; 4 * l];
            r.read_exact(&mut vbytes).map_err(|_| {
                IndexError::Corrupt(format!("truncated vector row {}", vectors.len()))
            })?;
            // pod_collect copes with the byte buffer's alignment.
            vectors.push(bytemuck::pod_collect_to_vec::<u8, f32>(&vbytes));
        }
        let dim = dim.ok_or_else(|| IndexError::Corrupt("vector snapshot is empty".into()))?;
        debug!(rows = vectors.len(), dim, "rebuilding nearest-neighbor graph from snapshot");
        Ok(Self::from_vectors(vectors, dim))
    }
}
