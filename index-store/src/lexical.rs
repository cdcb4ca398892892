//! BM25 lexical ranking over the chunk corpus.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// BM25 parameter k1 (term frequency saturation).
const BM25_K1: f32 = 1.2;

/// BM25 parameter b (length normalization).
const BM25_B: f32 = 0.75;

/// Immutable BM25 structure over the token multiset of every chunk.
/// Chunk identity is positional: row `i` scores `corpus[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Index {
    /// Per-chunk term frequencies.
    term_freqs: Vec<HashMap<String, u32>>,
    /// Number of chunks containing each term.
    doc_freqs: HashMap<String, u32>,
    /// Chunk lengths in tokens.
    doc_lens: Vec<u32>,
    avg_doc_len: f32,
}

impl Bm25Index {
    /// Build from the full ordered chunk list.
    pub fn build(chunks: &[String]) -> Self {
        let mut term_freqs = Vec::with_capacity(chunks.len());
        let mut doc_freqs: HashMap<String, u32> = HashMap::new();
        let mut doc_lens = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let tokens = crate::tokenize(chunk);
            doc_lens.push(tokens.len() as u32);
            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(freqs);
        }

        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<u32>() as f32 / doc_lens.len() as f32
        };

        Self { term_freqs, doc_freqs, doc_lens, avg_doc_len }
    }

    pub fn len(&self) -> usize {
        self.term_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.term_freqs.is_empty()
    }

    /// Non-negative IDF: `ln(1 + (N - df + 0.5) / (df + 0.5))`. Terms rare
    /// across the corpus score higher than common terms; terms absent from
    /// the corpus contribute nothing.
    fn idf(&self, term: &str) -> f32 {
        let df = match self.doc_freqs.get(term) {
            Some(&df) => df as f32,
            None => return 0.0,
        };
        let n = self.len() as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// BM25 score of one chunk against the tokenized query.
    fn score_chunk(&self, i: usize, query_tokens: &[String]) -> f32 {
        let freqs = &self.term_freqs[i];
        let dl = self.doc_lens[i] as f32;
        let mut score = 0.0f32;
        for term in query_tokens {
            let tf = match freqs.get(term) {
                Some(&tf) => tf as f32,
                None => continue,
            };
            let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * dl / self.avg_doc_len);
            score += self.idf(term) * (tf * (BM25_K1 + 1.0)) / (tf + norm);
        }
        score
    }

    /// Score every chunk against the query.
    pub fn score_all(&self, query_tokens: &[String]) -> Vec<f32> {
        (0..self.len()).map(|i| self.score_chunk(i, query_tokens)).collect()
    }

    /// Top-k chunks for a raw query string, as `(chunk position, score)`
    /// sorted descending. Ties keep original chunk order (stable sort).
    /// A query with no surviving tokens returns an empty list.
    pub fn query(&self, query: &str, top_k: usize) -> Vec<(usize, f32)> {
        let tokens = crate::tokenize(query);
        if tokens.is_empty() || top_k == 0 || self.is_empty() {
            return Vec::new();
        }
        let mut ranked: Vec<(usize, f32)> = self
            .score_all(&tokens)
            .into_iter()
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matching_chunk_ranks_first() {
        let index = Bm25Index::build(&corpus(&[
            "mars has two moons",
            "the moon orbits earth",
        ]));
        let hits = index.query("mars moons", 2);
        assert_eq!(hits[0].0, 0);
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn rare_term_scores_higher_than_common() {
        let index = Bm25Index::build(&corpus(&[
            "water water water",
            "water basalt",
            "water crater",
        ]));
        // "basalt" appears in one chunk, "water" in all three.
        let basalt = index.query("basalt", 1);
        let water = index.query("water", 3);
        assert_eq!(basalt[0].0, 1);
        assert!(basalt[0].1 > water[0].1);
    }

    #[test]
    fn repeated_terms_saturate() {
        let index = Bm25Index::build(&corpus(&[
            "dust dust dust dust dust dust dust dust",
            "dust dust dust dust wind wind wind wind",
        ]));
        let tokens = vec!["dust".to_string()];
        let scores = index.score_all(&tokens);
        // Doubling the term frequency must not double the score.
        assert!(scores[0] < 2.0 * scores[1]);
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn digit_terms_are_searchable() {
        let index = Bm25Index::build(&corpus(&[
            "mars 2 rover launch",
            "the moon orbits earth",
        ]));
        let hits = index.query("2", 1);
        assert_eq!(hits[0].0, 0);
        assert!(hits[0].1 > 0.0);
    }

    #[test]
    fn empty_query_returns_no_hits() {
        let index = Bm25Index::build(&corpus(&["mars has two moons"]));
        assert!(index.query("", 4).is_empty());
        assert!(index.query("?!", 4).is_empty());
    }

    #[test]
    fn ties_keep_original_chunk_order() {
        let index = Bm25Index::build(&corpus(&[
            "iron sky",
            "iron sky",
            "iron sky",
        ]));
        let hits = index.query("iron", 3);
        let order: Vec<usize> = hits.iter().map(|h| h.0).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn survives_serde_round_trip() {
        let index = Bm25Index::build(&corpus(&["mars has two moons", "the moon orbits earth"]));
        let json = serde_json::to_string(&index).unwrap();
        let back: Bm25Index = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.query("mars moons", 1)[0].0, 0);
    }
}
