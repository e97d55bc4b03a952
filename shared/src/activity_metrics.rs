//! Activity metrics calculations module
//!
//! Derives daily metrics (calories burned, active minutes, distance) from
//! raw step counts using fixed linear coefficients. The coefficients are a
//! deliberate simplification: no personalization by height, weight, or pace.
//!
//! All functions here are pure; the analytics aggregator in the engine crate
//! applies them over date-grouped activity records.

use crate::models::{DailyActivityRecord, UserAnalytics};
use chrono::NaiveDate;
use uuid::Uuid;

/// Steps burned per kilocalorie.
pub const STEPS_PER_CALORIE: f64 = 20.0;

/// Steps counted per active minute.
pub const STEPS_PER_ACTIVE_MINUTE: f64 = 100.0;

/// Average stride length in kilometers per step (0.762 m).
pub const KM_PER_STEP: f64 = 0.000762;

/// Estimated kilocalories burned for a step count.
pub fn calories_burned(steps: u32) -> f64 {
    f64::from(steps) / STEPS_PER_CALORIE
}

/// Estimated active minutes for a step count, rounded to the nearest minute.
pub fn active_minutes(steps: u32) -> u32 {
    (f64::from(steps) / STEPS_PER_ACTIVE_MINUTE).round() as u32
}

/// Estimated distance covered in kilometers for a step count.
pub fn distance_km(steps: u32) -> f64 {
    f64::from(steps) * KM_PER_STEP
}

/// Burned-minus-consumed calorie balance for a day.
pub fn calorie_difference(calories_burned: f64, calories_consumed: f64) -> f64 {
    calories_burned - calories_consumed
}

/// Derive the full per-day metric set from summed raw values.
pub fn derive_analytics(
    user_id: Uuid,
    date: NaiveDate,
    steps: u32,
    calories_consumed: f64,
) -> UserAnalytics {
    let burned = calories_burned(steps);
    UserAnalytics {
        user_id,
        date,
        step_count: steps,
        calories_burned: burned,
        calories_consumed,
        calorie_difference: calorie_difference(burned, calories_consumed),
        active_minutes: active_minutes(steps),
        distance_km: distance_km(steps),
    }
}

impl UserAnalytics {
    /// Derive metrics for a single raw activity record.
    pub fn from_record(record: &DailyActivityRecord) -> Self {
        derive_analytics(
            record.user_id,
            record.date,
            record.steps,
            record.calories_consumed,
        )
    }
}
