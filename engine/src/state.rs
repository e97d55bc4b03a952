//! Engine state management
//!
//! The composition root wiring the store, clock, weather collaborators, and
//! services together. Expensive resources (the search index handle, the
//! weather cache) are created once here; everything else is Arc'd so cloning
//! the state across tasks is O(1).

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::EngineResult;
use crate::search::{FoodSearchEngine, FoodSearchResult};
use crate::services::weather::{
    LocationProvider, OpenWeatherClient, WeatherListener, WeatherProvider, WeatherService,
};
use crate::services::{AnalyticsService, GoalService, RecommendationService};
use crate::store::{DocumentStore, MemoryStore};
use async_trait::async_trait;
use fitpulse_shared::{FitnessGoal, FitnessRecommendation, WeatherContext};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

/// Completes weather-dependent recommendations whose ideal condition no
/// longer holds, for every user this engine instance has generated for.
struct RecommendationInvalidator {
    recommendations: Arc<RecommendationService>,
    users: RwLock<HashSet<Uuid>>,
}

impl RecommendationInvalidator {
    async fn track(&self, user_id: Uuid) {
        self.users.write().await.insert(user_id);
    }
}

#[async_trait]
impl WeatherListener for RecommendationInvalidator {
    async fn weather_changed(&self, context: &WeatherContext) {
        let users: Vec<Uuid> = self.users.read().await.iter().copied().collect();
        for user_id in users {
            if let Err(err) = self
                .recommendations
                .invalidate_weather_dependent(user_id, context)
                .await
            {
                warn!(%user_id, error = %err, "weather-driven invalidation failed");
            }
        }
    }
}

/// Shared engine state
///
/// Holds the store, services, and search engine behind Arcs. Immutable after
/// creation; clone freely across async tasks.
#[derive(Clone)]
pub struct EngineState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub clock: Arc<dyn Clock>,
    pub analytics: Arc<AnalyticsService>,
    pub goals: Arc<GoalService>,
    pub recommendations: Arc<RecommendationService>,
    pub weather: Arc<WeatherService>,
    pub search: Arc<FoodSearchEngine>,
    invalidator: Arc<RecommendationInvalidator>,
}

impl EngineState {
    /// Wire the engine from explicit collaborators.
    ///
    /// Subscribes the recommendation invalidator to weather changes, so
    /// construction is async.
    pub async fn new<S, L, P>(
        config: AppConfig,
        store: Arc<S>,
        location: Arc<L>,
        provider: Arc<P>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        S: DocumentStore + 'static,
        L: LocationProvider + 'static,
        P: WeatherProvider + 'static,
    {
        let analytics = Arc::new(AnalyticsService::new(store.clone()));
        let goals = Arc::new(GoalService::new(store.clone(), clock.clone()));
        let recommendations = Arc::new(RecommendationService::new(store.clone(), clock.clone()));

        let weather = Arc::new(WeatherService::new(
            location,
            provider,
            clock.clone(),
            config.weather.cache_ttl(),
            config.weather.retry_max_attempts,
            config.weather.retry_interval(),
        ));

        let invalidator = Arc::new(RecommendationInvalidator {
            recommendations: recommendations.clone(),
            users: RwLock::new(HashSet::new()),
        });
        weather.subscribe(invalidator.clone()).await;

        let search = Arc::new(FoodSearchEngine::new(&config.search, clock.clone()));

        Self {
            config: Arc::new(config),
            store,
            clock,
            analytics,
            goals,
            recommendations,
            weather,
            search,
            invalidator,
        }
    }

    /// Production wiring: in-memory store, system clock, and the OpenWeather
    /// client configured from `config.weather`.
    pub async fn with_defaults<L>(config: AppConfig, location: Arc<L>) -> Self
    where
        L: LocationProvider + 'static,
    {
        let provider = Arc::new(OpenWeatherClient::new(
            config.weather.base_url.clone(),
            config.weather.api_key.clone(),
        ));
        Self::new(
            config,
            Arc::new(MemoryStore::new()),
            location,
            provider,
            Arc::new(SystemClock),
        )
        .await
    }

    /// Regenerate the full goal set for the current period.
    pub async fn refresh_goals(&self, user_id: Uuid) -> EngineResult<Vec<FitnessGoal>> {
        self.goals.expire_overdue(user_id).await?;
        self.goals.generate_for_user(user_id).await
    }

    /// Regenerate recommendations against the current weather context.
    ///
    /// Registers the user for weather-driven invalidation of the
    /// weather-dependent recommendations this pass produces.
    pub async fn refresh_recommendations(
        &self,
        user_id: Uuid,
    ) -> EngineResult<Vec<FitnessRecommendation>> {
        self.invalidator.track(user_id).await;
        let weather = self.weather.current().await;
        self.recommendations
            .generate_for_user(user_id, &weather)
            .await
    }

    /// Rank the food corpus against a query with the configured limit.
    pub async fn search_foods(&self, query: &str) -> EngineResult<Vec<FoodSearchResult>> {
        self.search.search_default(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::services::weather::{Coordinates, ProviderObservation};
    use chrono::TimeZone;
    use chrono::Utc;
    use fitpulse_shared::CoreError;
    use std::sync::Mutex;

    struct FixedLocation;

    #[async_trait]
    impl LocationProvider for FixedLocation {
        async fn locate(&self) -> Result<Coordinates, CoreError> {
            Ok(Coordinates {
                latitude: 45.5,
                longitude: -73.6,
            })
        }
    }

    /// Provider whose reported condition can be swapped between fetches.
    struct MutableProvider {
        condition: Mutex<String>,
    }

    impl MutableProvider {
        fn new(condition: &str) -> Self {
            Self {
                condition: Mutex::new(condition.to_string()),
            }
        }

        fn set_condition(&self, condition: &str) {
            *self.condition.lock().unwrap() = condition.to_string();
        }
    }

    #[async_trait]
    impl WeatherProvider for MutableProvider {
        async fn fetch(&self, _: Coordinates) -> Result<ProviderObservation, CoreError> {
            Ok(ProviderObservation {
                condition: self.condition.lock().unwrap().clone(),
                temperature_c: 24.0,
                humidity: 50.0,
                wind_speed_ms: 2.0,
            })
        }
    }

    async fn state_with(provider: Arc<MutableProvider>, clock: Arc<ManualClock>) -> EngineState {
        EngineState::new(
            AppConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(FixedLocation),
            provider,
            clock,
        )
        .await
    }

    fn test_clock() -> Arc<ManualClock> {
        // Saturday afternoon: sunny-day and weekend rules both fire.
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_state_clone_is_cheap() {
        let state = state_with(Arc::new(MutableProvider::new("Clear")), test_clock()).await;
        let _cloned = state.clone();
    }

    #[tokio::test]
    async fn test_weather_change_invalidates_dependent_recommendations() {
        let clock = test_clock();
        let provider = Arc::new(MutableProvider::new("Clear"));
        let state = state_with(provider.clone(), clock.clone()).await;
        let user_id = Uuid::new_v4();

        let generated = state.refresh_recommendations(user_id).await.unwrap();
        assert!(generated.iter().any(|r| r.weather_dependent));

        // Weather flips after the cache expires; the listener completes the
        // now-mismatched weather-dependent recommendations.
        provider.set_condition("Rain");
        clock.advance(chrono::Duration::minutes(31));
        state.weather.current().await;

        let active = state.recommendations.active(user_id).await.unwrap();
        assert!(active
            .iter()
            .filter(|r| r.weather_dependent)
            .all(|r| r.ideal_weather_condition.is_none()
                || r.ideal_weather_condition == Some(fitpulse_shared::WeatherCondition::Rainy)));
    }

    #[tokio::test]
    async fn test_refresh_recommendations_only_tracks_refreshed_users() {
        let clock = test_clock();
        let provider = Arc::new(MutableProvider::new("Clear"));
        let state = state_with(provider, clock).await;

        let user_id = Uuid::new_v4();
        state.refresh_recommendations(user_id).await.unwrap();
        assert!(state.invalidator.users.read().await.contains(&user_id));
        assert_eq!(state.invalidator.users.read().await.len(), 1);
    }
}
