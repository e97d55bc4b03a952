//! Hybrid food search
//!
//! Ranking precedence is fixed: prefix matches first (favoring the smallest
//! query-to-name length gap), then substring matches by earliest occurrence,
//! then vector matches with cosine similarity above the cutoff, deduplicated
//! by item id against matches already chosen. Queries shorter than three
//! characters skip vectorization entirely; similarity is unreliable there.
//!
//! Index initialization is lazy, single-flight, and guarded by a minimum
//! retry interval so rapid repeated calls cannot hammer reprocessing.

use super::index::FoodIndex;
use super::vectorizer::cosine_similarity;
use crate::clock::Clock;
use crate::config::SearchConfig;
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use fitpulse_shared::FoodItem;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Minimum cosine similarity for a vector match to count.
pub const SIMILARITY_CUTOFF: f64 = 0.1;

/// Queries shorter than this use text matching only.
pub const MIN_VECTOR_QUERY_LEN: usize = 3;

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Prefix,
    Substring,
    Vector,
}

/// One ranked search hit.
#[derive(Debug, Clone)]
pub struct FoodSearchResult {
    pub item: FoodItem,
    pub score: f64,
    pub matched: MatchKind,
}

enum IndexState {
    Empty,
    Ready(Arc<FoodIndex>),
    Failed { last_attempt: DateTime<Utc> },
}

/// Lazily initialized hybrid search engine over the food corpus.
pub struct FoodSearchEngine {
    corpus_path: PathBuf,
    cache_path: PathBuf,
    init_retry: chrono::Duration,
    default_limit: usize,
    clock: Arc<dyn Clock>,
    state: RwLock<IndexState>,
    init_lock: Mutex<()>,
}

impl FoodSearchEngine {
    pub fn new(config: &SearchConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            corpus_path: PathBuf::from(&config.corpus_path),
            cache_path: PathBuf::from(&config.cache_path),
            init_retry: config.init_retry(),
            default_limit: config.default_limit,
            clock,
            state: RwLock::new(IndexState::Empty),
            init_lock: Mutex::new(()),
        }
    }

    /// Rank the corpus against a free-text query.
    ///
    /// Prefix/substring matching is the guaranteed fallback: once the index
    /// is available it never fails for a well-formed query, and a failing
    /// vector stage only degrades the ranking.
    pub async fn search(&self, query: &str, limit: usize) -> EngineResult<Vec<FoodSearchResult>> {
        let index = self.ensure_index().await?;
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        if normalized.chars().count() < MIN_VECTOR_QUERY_LEN {
            return Ok(Self::text_search(&index, &normalized, limit));
        }

        let mut results = Self::text_search(&index, &normalized, limit);
        if results.len() < limit {
            Self::fill_vector_matches(&index, &normalized, limit, &mut results);
        }
        Ok(results)
    }

    /// Search with the configured default limit.
    pub async fn search_default(&self, query: &str) -> EngineResult<Vec<FoodSearchResult>> {
        self.search(query, self.default_limit).await
    }

    /// Prefix matches first (smaller length gap ranks higher), then
    /// substring matches by earliest occurrence.
    fn text_search(index: &FoodIndex, normalized: &str, limit: usize) -> Vec<FoodSearchResult> {
        let mut prefix: Vec<FoodSearchResult> = Vec::new();
        let mut substring: Vec<(usize, FoodSearchResult)> = Vec::new();

        for item in &index.items {
            let name = item.name.to_lowercase();
            if name.starts_with(normalized) {
                prefix.push(FoodSearchResult {
                    score: normalized.len() as f64 / name.len().max(1) as f64,
                    item: item.clone(),
                    matched: MatchKind::Prefix,
                });
            } else if let Some(position) = name.find(normalized) {
                substring.push((
                    position,
                    FoodSearchResult {
                        score: 1.0 / (1.0 + position as f64),
                        item: item.clone(),
                        matched: MatchKind::Substring,
                    },
                ));
            }
        }

        prefix.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.item.name.cmp(&b.item.name))
        });
        substring.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.item.name.cmp(&b.1.item.name)));

        let mut results = prefix;
        results.truncate(limit);
        for (_, result) in substring {
            if results.len() >= limit {
                break;
            }
            results.push(result);
        }
        results
    }

    /// Append vector matches above the similarity cutoff, skipping ids the
    /// text stages already claimed.
    fn fill_vector_matches(
        index: &FoodIndex,
        normalized: &str,
        limit: usize,
        results: &mut Vec<FoodSearchResult>,
    ) {
        let query_vector = index.vectorizer.vectorize(normalized);
        if query_vector.iter().all(|&x| x == 0.0) {
            // Fully out-of-vocabulary query: nothing to rank against.
            debug!(query = normalized, "query has no corpus vocabulary overlap");
            return;
        }

        let mut scored: Vec<(f64, &FoodItem)> = index
            .matrix
            .iter()
            .zip(&index.items)
            .map(|(row, item)| (cosine_similarity(&query_vector, row), item))
            .filter(|(similarity, _)| *similarity > SIMILARITY_CUTOFF)
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.name.cmp(&b.1.name))
        });

        for (similarity, item) in scored {
            if results.len() >= limit {
                break;
            }
            if results.iter().any(|r| r.item.id == item.id) {
                continue;
            }
            results.push(FoodSearchResult {
                item: item.clone(),
                score: similarity,
                matched: MatchKind::Vector,
            });
        }
    }

    /// Single-flight index initialization with a minimum retry interval.
    async fn ensure_index(&self) -> EngineResult<Arc<FoodIndex>> {
        if let Some(ready) = self.peek_index().await? {
            return Ok(ready);
        }

        let _guard = self.init_lock.lock().await;
        // Another caller may have finished (or failed) while we waited.
        if let Some(ready) = self.peek_index().await? {
            return Ok(ready);
        }

        match FoodIndex::load_or_build(&self.corpus_path, &self.cache_path) {
            Ok(index) => {
                let index = Arc::new(index);
                *self.state.write().await = IndexState::Ready(index.clone());
                Ok(index)
            }
            Err(err) => {
                warn!(error = %err, "food index initialization failed");
                *self.state.write().await = IndexState::Failed {
                    last_attempt: self.clock.now(),
                };
                Err(EngineError::from(err))
            }
        }
    }

    /// Ready index, a retry-window error, or `None` when a build attempt is
    /// due.
    async fn peek_index(&self) -> EngineResult<Option<Arc<FoodIndex>>> {
        let state = self.state.read().await;
        match &*state {
            IndexState::Ready(index) => Ok(Some(index.clone())),
            IndexState::Failed { last_attempt }
                if self.clock.now() - *last_attempt < self.init_retry =>
            {
                Err(EngineError::MalformedData(
                    "food index unavailable; last rebuild attempt failed".into(),
                ))
            }
            _ => Ok(None),
        }
    }
}
