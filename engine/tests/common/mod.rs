//! Common test utilities for integration tests
//!
//! Builds a fully wired [`EngineState`] on an in-memory store with a manual
//! clock, a fixed location, a scripted weather provider, and a small food
//! corpus in a temp directory.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fitpulse_engine::clock::ManualClock;
use fitpulse_engine::config::AppConfig;
use fitpulse_engine::services::weather::{
    Coordinates, LocationProvider, ProviderObservation, WeatherProvider,
};
use fitpulse_engine::state::EngineState;
use fitpulse_engine::store::{ActivityRepository, MemoryStore, ProfileRepository};
use fitpulse_shared::{CoreError, DailyActivityRecord, FitnessObjective, UserProfile};
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use uuid::Uuid;

/// Wednesday 2024-06-12, 14:00 UTC. Mid-month and mid-afternoon so monthly
/// windows and afternoon rules are exercised deterministically.
pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 12, 14, 0, 0).unwrap()
}

pub struct FixedLocation;

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, CoreError> {
        Ok(Coordinates {
            latitude: 45.5,
            longitude: -73.6,
        })
    }
}

/// Weather provider returning a scripted observation, swappable mid-test.
pub struct ScriptedWeather {
    observation: Mutex<ProviderObservation>,
}

impl ScriptedWeather {
    pub fn new(condition: &str, temperature_c: f64) -> Self {
        Self {
            observation: Mutex::new(ProviderObservation {
                condition: condition.to_string(),
                temperature_c,
                humidity: 50.0,
                wind_speed_ms: 2.0,
            }),
        }
    }

    pub fn set(&self, condition: &str, temperature_c: f64) {
        let mut observation = self.observation.lock().unwrap();
        observation.condition = condition.to_string();
        observation.temperature_c = temperature_c;
    }
}

#[async_trait]
impl WeatherProvider for ScriptedWeather {
    async fn fetch(&self, _: Coordinates) -> Result<ProviderObservation, CoreError> {
        Ok(self.observation.lock().unwrap().clone())
    }
}

/// Test engine wrapper
pub struct TestEngine {
    pub state: EngineState,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub weather: Arc<ScriptedWeather>,
    _dir: tempfile::TempDir,
}

impl TestEngine {
    /// Wire a fresh engine with a sunny 24 degC default forecast.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = dir.path().join("food_corpus.csv");
        write_corpus(&corpus);

        let mut config = AppConfig::default();
        config.search.corpus_path = corpus.to_string_lossy().into_owned();
        config.search.cache_path = dir
            .path()
            .join("food_index.json")
            .to_string_lossy()
            .into_owned();
        config.weather.retry_interval_ms = 0;

        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(test_start()));
        let weather = Arc::new(ScriptedWeather::new("Clear", 24.0));

        let state = EngineState::new(
            config,
            store.clone(),
            Arc::new(FixedLocation),
            weather.clone(),
            clock.clone(),
        )
        .await;

        Self {
            state,
            store,
            clock,
            weather,
            _dir: dir,
        }
    }

    pub fn today(&self) -> NaiveDate {
        test_start().date_naive()
    }

    /// Seed a profile and return its user id.
    pub async fn seed_profile(
        &self,
        fitness_goal: FitnessObjective,
        weight_kg: Option<f64>,
        daily_calorie_goal: Option<f64>,
    ) -> Uuid {
        let user_id = Uuid::new_v4();
        self.store
            .put_profile(UserProfile {
                user_id,
                fitness_goal,
                weight_kg,
                daily_calorie_goal,
            })
            .await
            .expect("seed profile");
        user_id
    }

    /// Log identical activity for each of the `days` most recent days,
    /// today included.
    pub async fn seed_uniform_activity(
        &self,
        user_id: Uuid,
        days: i64,
        steps: u32,
        calories_consumed: f64,
    ) {
        for offset in 0..days {
            let date = self.today() - chrono::Duration::days(offset);
            self.store
                .log(DailyActivityRecord {
                    user_id,
                    date,
                    steps,
                    calories_consumed,
                })
                .await
                .expect("seed activity");
        }
    }
}

fn write_corpus(path: &std::path::Path) {
    let mut file = std::fs::File::create(path).expect("corpus file");
    writeln!(file, "id,name,calories,protein,carbs,fat").expect("corpus header");
    for (id, name, calories, protein, carbs, fat) in [
        ("f1", "Apple", 52.0, 0.3, 14.0, 0.2),
        ("f2", "Apple Pie", 237.0, 1.9, 34.0, 11.0),
        ("f3", "Pineapple", 50.0, 0.5, 13.0, 0.1),
        ("f4", "Chicken Breast", 165.0, 31.0, 0.0, 3.6),
        ("f5", "Grilled Chicken Salad", 180.0, 25.0, 6.0, 7.0),
        ("f6", "Greek Yogurt", 59.0, 10.0, 3.6, 0.4),
    ] {
        writeln!(file, "{id},{name},{calories},{protein},{carbs},{fat}").expect("corpus row");
    }
}
