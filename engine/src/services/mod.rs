//! Business logic services
//!
//! Services encapsulate the engine's rule and derivation logic and
//! coordinate between the document store and external collaborators.

pub mod analytics;
pub mod goals;
pub mod recommendations;
pub mod weather;

pub use analytics::AnalyticsService;
pub use goals::GoalService;
pub use recommendations::RecommendationService;
pub use weather::WeatherService;
