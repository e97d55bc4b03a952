//! Food index: corpus, vocabulary, and derived vectors
//!
//! Built once from the CSV corpus bundle and cached to disk as versioned
//! JSON. Loading tries the processed cache first; any miss, version
//! mismatch, or corruption falls back to reprocessing from the corpus and
//! rewriting the cache.

use super::vectorizer::TfidfVectorizer;
use fitpulse_shared::{CoreError, FoodItem};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Bumped whenever the tokenizer or weighting changes shape.
pub const CACHE_VERSION: u32 = 1;

/// Vocabulary, IDF weights, per-item TF-IDF rows, and item metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodIndex {
    pub version: u32,
    pub vectorizer: TfidfVectorizer,
    /// One dense TF-IDF row per item; columns span the vocabulary.
    pub matrix: Vec<Vec<f64>>,
    pub items: Vec<FoodItem>,
}

impl FoodIndex {
    /// Build the index from corpus items.
    pub fn build(items: Vec<FoodItem>) -> Self {
        let documents: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
        let vectorizer = TfidfVectorizer::fit(&documents);
        let matrix = documents.iter().map(|d| vectorizer.vectorize(d)).collect();
        Self {
            version: CACHE_VERSION,
            vectorizer,
            matrix,
            items,
        }
    }

    /// Load the processed cache, or rebuild from the corpus and rewrite it.
    ///
    /// Cache problems are recoverable (rebuild); an unreadable corpus is
    /// not.
    pub fn load_or_build(corpus_path: &Path, cache_path: &Path) -> Result<Self, CoreError> {
        match Self::load_cache(cache_path) {
            Ok(index) => {
                debug!(path = %cache_path.display(), "loaded food index from cache");
                return Ok(index);
            }
            Err(err) => {
                debug!(path = %cache_path.display(), error = %err, "food index cache unusable");
            }
        }

        let items = load_corpus(corpus_path)?;
        let index = Self::build(items);
        info!(
            items = index.items.len(),
            dimensions = index.vectorizer.dimensions(),
            "rebuilt food index from corpus"
        );

        if let Err(err) = index.write_cache(cache_path) {
            // A missing cache only costs a rebuild next start.
            warn!(path = %cache_path.display(), error = %err, "failed to write food index cache");
        }
        Ok(index)
    }

    fn load_cache(cache_path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read_to_string(cache_path)
            .map_err(|e| CoreError::MalformedData(format!("cache unreadable: {e}")))?;
        let index: FoodIndex = serde_json::from_str(&raw)
            .map_err(|e| CoreError::MalformedData(format!("cache corrupt: {e}")))?;
        if index.version != CACHE_VERSION {
            return Err(CoreError::MalformedData(format!(
                "cache version {} != {}",
                index.version, CACHE_VERSION
            )));
        }
        if index.matrix.len() != index.items.len() {
            return Err(CoreError::MalformedData(
                "cache matrix/items length mismatch".into(),
            ));
        }
        Ok(index)
    }

    fn write_cache(&self, cache_path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CoreError::MalformedData(format!("cache dir: {e}")))?;
        }
        let raw = serde_json::to_string(self)
            .map_err(|e| CoreError::MalformedData(format!("cache encode: {e}")))?;
        fs::write(cache_path, raw)
            .map_err(|e| CoreError::MalformedData(format!("cache write: {e}")))?;
        Ok(())
    }
}

/// Read the CSV corpus bundle (columns: id, name, calories, protein,
/// carbs, fat).
pub fn load_corpus(corpus_path: &Path) -> Result<Vec<FoodItem>, CoreError> {
    let mut reader = csv::Reader::from_path(corpus_path)
        .map_err(|e| CoreError::MalformedData(format!("corpus unreadable: {e}")))?;
    let mut items = Vec::new();
    for row in reader.deserialize() {
        let item: FoodItem =
            row.map_err(|e| CoreError::MalformedData(format!("corpus row: {e}")))?;
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_items() -> Vec<FoodItem> {
        vec![
            FoodItem {
                id: "f1".into(),
                name: "Chicken Breast".into(),
                calories: 165.0,
                protein: 31.0,
                carbs: 0.0,
                fat: 3.6,
            },
            FoodItem {
                id: "f2".into(),
                name: "Greek Yogurt".into(),
                calories: 59.0,
                protein: 10.0,
                carbs: 3.6,
                fat: 0.4,
            },
        ]
    }

    #[test]
    fn test_build_shapes_match() {
        let index = FoodIndex::build(sample_items());
        assert_eq!(index.matrix.len(), index.items.len());
        assert!(index
            .matrix
            .iter()
            .all(|row| row.len() == index.vectorizer.dimensions()));
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("index.json");
        let index = FoodIndex::build(sample_items());
        index.write_cache(&cache).unwrap();

        let loaded = FoodIndex::load_cache(&cache).unwrap();
        assert_eq!(loaded.items, index.items);
        assert_eq!(loaded.matrix, index.matrix);
    }

    #[test]
    fn test_corrupt_cache_rebuilds_from_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.csv");
        let cache = dir.path().join("index.json");

        let mut file = fs::File::create(&corpus).unwrap();
        writeln!(file, "id,name,calories,protein,carbs,fat").unwrap();
        writeln!(file, "f1,Chicken Breast,165,31,0,3.6").unwrap();

        fs::write(&cache, "{not json").unwrap();

        let index = FoodIndex::load_or_build(&corpus, &cache).unwrap();
        assert_eq!(index.items.len(), 1);

        // The cache was rewritten and now loads cleanly.
        let reloaded = FoodIndex::load_cache(&cache).unwrap();
        assert_eq!(reloaded.items.len(), 1);
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("index.json");
        let mut index = FoodIndex::build(sample_items());
        index.version = CACHE_VERSION + 1;
        index.write_cache(&cache).unwrap();

        assert!(FoodIndex::load_cache(&cache).is_err());
    }

    #[test]
    fn test_missing_corpus_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        let cache = dir.path().join("index.json");
        let err = FoodIndex::load_or_build(&missing, &cache).unwrap_err();
        assert!(matches!(err, CoreError::MalformedData(_)));
    }
}
