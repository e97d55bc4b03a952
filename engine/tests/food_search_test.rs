//! Integration tests for food search through the engine state

mod common;

use common::TestEngine;
use fitpulse_engine::search::MatchKind;

#[tokio::test]
async fn test_prefix_beats_substring_beats_vector() {
    let engine = TestEngine::new().await;

    let results = engine.state.search_foods("apple").await.unwrap();
    assert!(results.len() >= 3);
    assert_eq!(results[0].item.name, "Apple");
    assert_eq!(results[0].matched, MatchKind::Prefix);
    assert_eq!(results[1].item.name, "Apple Pie");
    assert_eq!(results[2].item.name, "Pineapple");
    assert_eq!(results[2].matched, MatchKind::Substring);
}

#[tokio::test]
async fn test_token_overlap_found_without_literal_match() {
    let engine = TestEngine::new().await;

    let results = engine.state.search_foods("yogurt greek").await.unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].item.name, "Greek Yogurt");
    assert_eq!(results[0].matched, MatchKind::Vector);
}

#[tokio::test]
async fn test_unknown_food_returns_empty() {
    let engine = TestEngine::new().await;
    assert!(engine.state.search_foods("quinoa").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let engine = TestEngine::new().await;
    let lower = engine.state.search_foods("chicken").await.unwrap();
    let upper = engine.state.search_foods("CHICKEN").await.unwrap();

    let lower_ids: Vec<&str> = lower.iter().map(|r| r.item.id.as_str()).collect();
    let upper_ids: Vec<&str> = upper.iter().map(|r| r.item.id.as_str()).collect();
    assert_eq!(lower_ids, upper_ids);
}

#[tokio::test]
async fn test_index_cache_is_written_and_reused() {
    let engine = TestEngine::new().await;
    engine.state.search_foods("apple").await.unwrap();

    let cache_path = std::path::PathBuf::from(&engine.state.config.search.cache_path);
    assert!(cache_path.exists());

    // A second engine over the same paths loads the cache it left behind.
    let raw = std::fs::read_to_string(&cache_path).unwrap();
    assert!(raw.contains("Apple Pie"));
}

#[tokio::test]
async fn test_short_queries_stay_on_text_matching() {
    let engine = TestEngine::new().await;

    let results = engine.state.search_foods("gr").await.unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.matched != MatchKind::Vector));
}
