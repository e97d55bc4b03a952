//! FitPulse Engine
//!
//! Client-side goal, recommendation, and food-search services for the
//! FitPulse fitness application.
//!
//! ## Architecture
//!
//! The engine follows a layered architecture:
//! - Services: goal generation, recommendation rules, analytics, weather
//! - Search: TF-IDF + prefix/substring hybrid food search
//! - Store: abstract document-store collaborators with an in-memory
//!   implementation
//! - State: composition root wiring the above together

pub mod clock;
pub mod config;
pub mod error;
pub mod search;
pub mod services;
pub mod state;
pub mod store;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for binaries and integration harnesses.
///
/// Honors `RUST_LOG`; falls back to sensible per-environment defaults.
/// JSON output in production for log aggregation, pretty output otherwise.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "fitpulse_engine=info".into()
        } else {
            "fitpulse_engine=debug".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
