//! Integration tests for recommendation generation and lifecycle

mod common;

use chrono::Utc;
use common::TestEngine;
use fitpulse_shared::{
    FitnessObjective, FitnessRecommendation, Priority, RecommendationCategory,
};
use fitpulse_engine::store::RecommendationRepository;
use uuid::Uuid;

fn titles(recs: &[FitnessRecommendation]) -> Vec<&str> {
    recs.iter().map(|r| r.title.as_str()).collect()
}

fn stub_recommendation(user_id: Uuid, age_days: i64) -> FitnessRecommendation {
    FitnessRecommendation {
        id: Uuid::new_v4(),
        user_id,
        title: format!("stub {age_days}d"),
        description: String::new(),
        category: RecommendationCategory::General,
        priority: Priority::Low,
        completed: false,
        weather_dependent: false,
        ideal_weather_condition: None,
        time_of_day_dependent: false,
        ideal_time_of_day: None,
        expires_at: None,
        created_at: common::test_start() - chrono::Duration::days(age_days),
    }
}

#[tokio::test]
async fn test_sunny_afternoon_without_history() {
    let engine = TestEngine::new().await;
    let user_id = Uuid::new_v4();

    let recs = engine.state.refresh_recommendations(user_id).await.unwrap();

    // Sunny 24 degC on a Wednesday afternoon: the outdoor and time-of-day
    // rules fire, nothing else has context to act on.
    assert_eq!(
        titles(&recs),
        vec!["Perfect day outside", "Afternoon break"]
    );
    let outdoor = &recs[0];
    assert!(outdoor.weather_dependent);
    assert_eq!(outdoor.priority, Priority::High);
    assert!(outdoor.expires_at.is_some());
}

#[tokio::test]
async fn test_behind_on_steps_in_the_afternoon() {
    let engine = TestEngine::new().await;
    let user_id = engine
        .seed_profile(FitnessObjective::Maintenance, None, None)
        .await;
    engine.state.refresh_goals(user_id).await.unwrap();

    let recs = engine.state.refresh_recommendations(user_id).await.unwrap();

    // Fresh daily step goal with zero progress after noon.
    assert!(titles(&recs).contains(&"Get moving"));
    let get_moving = recs.iter().find(|r| r.title == "Get moving").unwrap();
    assert_eq!(get_moving.priority, Priority::High);
    assert_eq!(get_moving.category, RecommendationCategory::Exercise);
}

#[tokio::test]
async fn test_rainy_day_swaps_to_indoor_suggestions() {
    let engine = TestEngine::new().await;
    engine.weather.set("Rain", 10.0);
    let user_id = Uuid::new_v4();

    let recs = engine.state.refresh_recommendations(user_id).await.unwrap();

    assert_eq!(titles(&recs), vec!["Rainy day workout", "Afternoon break"]);
    // Not outdoor friendly, so the time-of-day suggestion drops to low.
    let afternoon = recs.iter().find(|r| r.title == "Afternoon break").unwrap();
    assert_eq!(afternoon.priority, Priority::Low);
}

#[tokio::test]
async fn test_extreme_heat_raises_warnings() {
    let engine = TestEngine::new().await;
    engine.weather.set("Clear", 36.0);
    let user_id = Uuid::new_v4();

    let recs = engine.state.refresh_recommendations(user_id).await.unwrap();

    let rec_titles = titles(&recs);
    assert!(rec_titles.contains(&"Heat warning"));
    assert!(rec_titles.contains(&"Stay hydrated"));
    let hydrate = recs.iter().find(|r| r.title == "Stay hydrated").unwrap();
    assert_eq!(hydrate.priority, Priority::High);
}

#[tokio::test]
async fn test_heavy_streak_triggers_recovery() {
    let engine = TestEngine::new().await;
    let user_id = engine
        .seed_profile(FitnessObjective::Maintenance, None, None)
        .await;
    engine
        .seed_uniform_activity(user_id, 3, 12000, 2200.0)
        .await;

    let recs = engine.state.refresh_recommendations(user_id).await.unwrap();
    assert!(titles(&recs).contains(&"Recovery time"));
}

#[tokio::test]
async fn test_stale_recommendations_are_purged_before_generation() {
    let engine = TestEngine::new().await;
    let user_id = Uuid::new_v4();

    let stale = stub_recommendation(user_id, 3);
    let recent = stub_recommendation(user_id, 1);
    engine
        .store
        .put_recommendation(stale.clone())
        .await
        .unwrap();
    engine
        .store
        .put_recommendation(recent.clone())
        .await
        .unwrap();

    engine.state.refresh_recommendations(user_id).await.unwrap();

    let active = engine.state.recommendations.active(user_id).await.unwrap();
    let ids: Vec<Uuid> = active.iter().map(|r| r.id).collect();
    assert!(!ids.contains(&stale.id));
    assert!(ids.contains(&recent.id));
}

#[tokio::test]
async fn test_active_orders_by_priority_and_completion_is_terminal() {
    let engine = TestEngine::new().await;
    let user_id = Uuid::new_v4();

    engine.state.refresh_recommendations(user_id).await.unwrap();
    let active = engine.state.recommendations.active(user_id).await.unwrap();
    assert!(active.len() >= 2);
    for pair in active.windows(2) {
        assert!(pair[0].priority >= pair[1].priority);
    }

    let top = active[0].id;
    assert!(engine.state.recommendations.mark_completed(top).await.unwrap());
    // Second completion is a no-op.
    assert!(!engine.state.recommendations.mark_completed(top).await.unwrap());

    let remaining = engine.state.recommendations.active(user_id).await.unwrap();
    assert!(remaining.iter().all(|r| r.id != top));
}

#[tokio::test]
async fn test_expired_contextual_recommendations_drop_out() {
    let engine = TestEngine::new().await;
    let user_id = Uuid::new_v4();

    engine.state.refresh_recommendations(user_id).await.unwrap();
    let before = engine.state.recommendations.active(user_id).await.unwrap();
    assert!(!before.is_empty());

    // All generated recommendations here are contextual with a 24 h expiry.
    engine.clock.advance(chrono::Duration::hours(25));
    let after = engine.state.recommendations.active(user_id).await.unwrap();
    assert!(after.is_empty());
}

#[tokio::test]
async fn test_created_at_comes_from_the_engine_clock() {
    let engine = TestEngine::new().await;
    let user_id = Uuid::new_v4();

    let recs = engine.state.refresh_recommendations(user_id).await.unwrap();
    for rec in &recs {
        assert_eq!(rec.created_at, common::test_start());
        assert!(rec.created_at <= Utc::now());
    }
}
