//! FitPulse Shared Library
//!
//! This crate contains the domain models, error taxonomy, and pure
//! activity-metric calculations shared across the FitPulse engine.

pub mod activity_metrics;
pub mod errors;
pub mod models;

// Re-export commonly used items
pub use activity_metrics::*;
pub use errors::*;
pub use models::*;
