//! Fitted TF-IDF vectorizer: the transform that projects text into the
//! vector index's space. Persisted alongside the vector index because
//! queries must be projected with the exact fitted vocabulary and weights.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Term-weighting model fitted once on the chunk corpus. Never refit at
/// query time: a refit silently desynchronizes query vectors from the
/// indexed vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term -> vector component, terms in sorted order.
    vocab: BTreeMap<String, usize>,
    /// Smoothed inverse document frequency per component.
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Fit vocabulary and IDF weights on the full chunk corpus.
    pub fn fit(chunks: &[String]) -> Self {
        let n = chunks.len() as f32;
        let mut doc_freqs: HashMap<String, u32> = HashMap::new();
        for chunk in chunks {
            let mut seen: Vec<String> = crate::tokenize(chunk);
            seen.sort();
            seen.dedup();
            for term in seen {
                *doc_freqs.entry(term).or_insert(0) += 1;
            }
        }

        let vocab: BTreeMap<String, usize> = doc_freqs
            .keys()
            .cloned()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term, i))
            .collect();

        // Smoothed IDF: ln((1 + N) / (1 + df)) + 1.
        let mut idf = vec![0.0f32; vocab.len()];
        for (term, &slot) in &vocab {
            let df = doc_freqs[term] as f32;
            idf[slot] = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
        }

        Self { vocab, idf }
    }

    /// Dimensionality of the fitted vector space.
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Project text into the fitted space: raw term counts weighted by IDF,
    /// L2-normalized. Terms outside the fitted vocabulary are ignored; text
    /// with no known terms yields the zero vector.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimension()];
        for token in crate::tokenize(text) {
            if let Some(&slot) = self.vocab.get(&token) {
                vec[slot] += 1.0;
            }
        }
        for (slot, weight) in vec.iter_mut().enumerate() {
            *weight *= self.idf[slot];
        }
        let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}
