//! Configuration management for the FitPulse engine
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: FP__)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub weather: WeatherConfig,
    pub search: SearchConfig,
}

/// Weather provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the weather provider API
    pub base_url: String,
    /// Provider API key; wrapped in a `SecretString` by the client
    pub api_key: String,
    /// Cache validity window in seconds
    pub cache_ttl_secs: u64,
    /// Maximum fetch attempts per cache miss
    pub retry_max_attempts: u32,
    /// Delay between fetch attempts in milliseconds
    pub retry_interval_ms: u64,
}

impl WeatherConfig {
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs as i64)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

/// Food search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Path to the CSV food corpus bundle
    pub corpus_path: String,
    /// Path of the processed index cache
    pub cache_path: String,
    /// Minimum interval between index build attempts, in seconds
    pub init_retry_secs: u64,
    /// Result limit applied when the caller does not pass one
    pub default_limit: usize,
}

impl SearchConfig {
    pub fn init_retry(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.init_retry_secs as i64)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig {
                base_url: "https://api.openweathermap.org".to_string(),
                api_key: String::new(),
                cache_ttl_secs: 30 * 60,
                retry_max_attempts: 2,
                retry_interval_ms: 500,
            },
            search: SearchConfig {
                corpus_path: "data/food_corpus.csv".to_string(),
                cache_path: "data/food_index.json".to_string(),
                init_retry_secs: 5,
                default_limit: 20,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with FP__ prefix
    ///    e.g., FP__WEATHER__API_KEY=... sets weather.api_key
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(&config_file).required(false))
            .add_source(config::Environment::with_prefix("FP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}
