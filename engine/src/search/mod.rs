//! Food search subsystem
//!
//! TF-IDF vectorization plus prefix/substring matching over a static food
//! corpus, with a disk-backed cache for the derived vectors. The ranking
//! precedence is fixed: prefix matches first, then substring matches, then
//! vector matches above the similarity cutoff.

pub mod engine;
pub mod index;
pub mod tokenizer;
pub mod vectorizer;

pub use engine::{FoodSearchEngine, FoodSearchResult, MatchKind};
pub use index::FoodIndex;
pub use tokenizer::tokenize;
pub use vectorizer::{cosine_similarity, TfidfVectorizer};
