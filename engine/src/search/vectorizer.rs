//! TF-IDF vectorization and cosine similarity

use super::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Vocabulary and inverse-document-frequency weights fitted on a corpus.
///
/// Queries are vectorized with the same vocabulary and IDF weights as the
/// corpus rows; out-of-vocabulary tokens contribute zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit vocabulary and IDF weights on corpus documents.
    ///
    /// Uses smoothed IDF (`ln((1 + n) / (1 + df)) + 1`) so no weight is
    /// ever zero or negative.
    pub fn fit(documents: &[String]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();

        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();
        for tokens in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let index = *vocabulary.entry(token.clone()).or_insert_with(|| {
                    document_frequency.push(0);
                    document_frequency.len() - 1
                });
                if !seen.contains(&index) {
                    document_frequency[index] += 1;
                    seen.push(index);
                }
            }
        }

        let n = documents.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    /// Number of vocabulary dimensions.
    pub fn dimensions(&self) -> usize {
        self.idf.len()
    }

    /// TF x IDF vector for a document or query. Out-of-vocabulary tokens
    /// are dropped.
    pub fn vectorize(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.idf.len()];
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vector;
        }
        let total = tokens.len() as f64;
        for token in &tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                vector[index] += 1.0;
            }
        }
        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value = (*value / total) * idf;
        }
        vector
    }
}

/// Normalized dot-product similarity in [-1, 1]. Zero vectors compare as 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
