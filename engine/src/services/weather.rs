//! Weather context service
//!
//! Fetches and caches a simplified weather snapshot for the recommendation
//! rules. The cache has a 30-minute validity window; within it the cached
//! context is returned unconditionally. On a miss the service acquires
//! device location, queries the provider with an explicit retry policy, and
//! maps the provider vocabulary onto the internal four-way condition enum.
//!
//! Every failure path (location permission denied, network error, malformed
//! response) falls back to a fixed default context: `current()` always
//! resolves to some [`WeatherContext`] and never errors past this point.

use crate::clock::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fitpulse_shared::{CoreError, WeatherCondition, WeatherContext};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Location collaborator. `PermissionDenied` fails the whole fetch and
/// triggers the default-context fallback.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, CoreError>;
}

/// Raw provider observation, still in the provider's condition vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderObservation {
    pub condition: String,
    pub temperature_c: f64,
    pub humidity: f64,
    pub wind_speed_ms: f64,
}

/// Weather API collaborator.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, coordinates: Coordinates) -> Result<ProviderObservation, CoreError>;
}

/// Notified after every successful real fetch so stale weather-dependent
/// recommendations can be invalidated.
#[async_trait]
pub trait WeatherListener: Send + Sync {
    async fn weather_changed(&self, context: &WeatherContext);
}

/// Conditions treated as precipitation for the outdoor-friendly check.
const PRECIPITATION: &[&str] = &["rain", "drizzle", "thunderstorm", "snow"];

/// Map the provider condition vocabulary to the internal enum. Unknown
/// conditions (mist, haze, ...) read as cloudy.
pub fn map_condition(provider_condition: &str) -> WeatherCondition {
    match provider_condition.to_lowercase().as_str() {
        "clear" => WeatherCondition::Sunny,
        "clouds" => WeatherCondition::Cloudy,
        "rain" | "drizzle" | "thunderstorm" => WeatherCondition::Rainy,
        "snow" => WeatherCondition::Snowy,
        _ => WeatherCondition::Cloudy,
    }
}

/// Outdoor-friendly classification: no precipitation, temperature within
/// 5..=35 degC (boundary inclusive), wind at most 10 m/s.
pub fn is_outdoor_friendly(provider_condition: &str, temperature_c: f64, wind_speed_ms: f64) -> bool {
    let condition = provider_condition.to_lowercase();
    !PRECIPITATION.contains(&condition.as_str())
        && (5.0..=35.0).contains(&temperature_c)
        && wind_speed_ms <= 10.0
}

/// Build the internal context from a raw observation.
pub fn classify(observation: &ProviderObservation) -> WeatherContext {
    WeatherContext {
        condition: map_condition(&observation.condition),
        temperature_c: observation.temperature_c,
        humidity: observation.humidity,
        wind_speed_ms: observation.wind_speed_ms,
        is_outdoor_friendly: is_outdoor_friendly(
            &observation.condition,
            observation.temperature_c,
            observation.wind_speed_ms,
        ),
    }
}

/// Fallback context used whenever a real fetch is impossible.
pub fn default_context() -> WeatherContext {
    WeatherContext {
        condition: WeatherCondition::Sunny,
        temperature_c: 22.0,
        humidity: 60.0,
        wind_speed_ms: 5.0,
        is_outdoor_friendly: true,
    }
}

/// Weather API client speaking the OpenWeather current-conditions shape.
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    weather: Vec<ApiCondition>,
    main: ApiMain,
    wind: ApiWind,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    main: String,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct ApiWind {
    speed: f64,
}

impl OpenWeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: SecretString::new(api_key.into()),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch(&self, coordinates: Coordinates) -> Result<ProviderObservation, CoreError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.expose_secret().clone()),
            ])
            .send()
            .await
            .map_err(|e| CoreError::UpstreamUnavailable(format!("weather request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::UpstreamUnavailable(format!(
                "weather api returned {}",
                response.status()
            )));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| CoreError::MalformedData(format!("weather response: {e}")))?;

        let condition = body
            .weather
            .first()
            .map(|c| c.main.clone())
            .ok_or_else(|| CoreError::MalformedData("empty weather condition list".into()))?;

        Ok(ProviderObservation {
            condition,
            temperature_c: body.main.temp,
            humidity: body.main.humidity,
            wind_speed_ms: body.wind.speed,
        })
    }
}

/// Cached weather context with change notification.
pub struct WeatherService {
    location: Arc<dyn LocationProvider>,
    provider: Arc<dyn WeatherProvider>,
    clock: Arc<dyn Clock>,
    cache_ttl: chrono::Duration,
    retry_max_attempts: u32,
    retry_interval: Duration,
    cached: RwLock<Option<(WeatherContext, DateTime<Utc>)>>,
    listeners: RwLock<Vec<Arc<dyn WeatherListener>>>,
}

impl WeatherService {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        provider: Arc<dyn WeatherProvider>,
        clock: Arc<dyn Clock>,
        cache_ttl: chrono::Duration,
        retry_max_attempts: u32,
        retry_interval: Duration,
    ) -> Self {
        Self {
            location,
            provider,
            clock,
            cache_ttl,
            retry_max_attempts,
            retry_interval,
            cached: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener fired after each successful real fetch.
    pub async fn subscribe(&self, listener: Arc<dyn WeatherListener>) {
        self.listeners.write().await.push(listener);
    }

    /// Current weather context. Returns the cache when fresh, otherwise
    /// fetches; never errors — failures resolve to the default context.
    pub async fn current(&self) -> WeatherContext {
        let now = self.clock.now();
        if let Some((context, fetched_at)) = self.cached.read().await.as_ref() {
            if now - *fetched_at < self.cache_ttl {
                return context.clone();
            }
        }

        match self.fetch_fresh().await {
            Ok(context) => {
                *self.cached.write().await = Some((context.clone(), self.clock.now()));
                self.notify(&context).await;
                context
            }
            Err(err) => {
                warn!(error = %err, "weather fetch failed, using default context");
                default_context()
            }
        }
    }

    async fn fetch_fresh(&self) -> Result<WeatherContext, CoreError> {
        let coordinates = self.location.locate().await?;
        debug!(
            lat = coordinates.latitude,
            lon = coordinates.longitude,
            "fetching weather"
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.provider.fetch(coordinates).await {
                Ok(observation) => return Ok(classify(&observation)),
                Err(err) if attempt < self.retry_max_attempts => {
                    warn!(error = %err, attempt, "weather fetch attempt failed, retrying");
                    tokio::time::sleep(self.retry_interval).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn notify(&self, context: &WeatherContext) {
        let listeners = self.listeners.read().await;
        for listener in listeners.iter() {
            listener.weather_changed(context).await;
        }
    }
}
