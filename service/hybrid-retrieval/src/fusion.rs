//! Fusion of ranked results from the lexical and vector indexes.

use chunk_model::{RetrievalHit, RetrievalMethod};

/// Outcome of the best-of policy: the winning hit and which method won.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BestRetrieval {
    pub hit: RetrievalHit,
    pub winner: RetrievalMethod,
}

/// Merge-and-rerank: concatenate both hit lists, sort by score descending,
/// truncate to `k`. The sort is stable, so equal scores keep lexical-first
/// input order. Overlapping chunks returned by both methods are NOT
/// de-duplicated; a chunk scoring highly under both methods is a useful
/// confidence signal, and suppression is the caller's call.
pub fn merge_and_rerank(
    lexical: Vec<RetrievalHit>,
    vector: Vec<RetrievalHit>,
    k: usize,
) -> Vec<RetrievalHit> {
    let mut merged = lexical;
    merged.extend(vector);
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(k);
    merged
}

/// Best-of: compare the single top hit from each method on the shared
/// similarity scale and pick one. The vector hit wins only when its score
/// is strictly greater; ties go to the lexical method. Tolerates zero hits
/// from either or both sources.
pub fn best_of(lexical: Option<RetrievalHit>, vector: Option<RetrievalHit>) -> Option<BestRetrieval> {
    match (lexical, vector) {
        (None, None) => None,
        (Some(hit), None) => Some(BestRetrieval { winner: hit.method, hit }),
        (None, Some(hit)) => Some(BestRetrieval { winner: hit.method, hit }),
        (Some(lex), Some(vec)) => {
            if vec.score > lex.score {
                Some(BestRetrieval { winner: vec.method, hit: vec })
            } else {
                Some(BestRetrieval { winner: lex.method, hit: lex })
            }
        }
    }
}
