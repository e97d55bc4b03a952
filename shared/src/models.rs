//! Data models for the FitPulse engine

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw per-day activity log entry. Unique per (user, date); multiple log
/// events on the same day are additive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivityRecord {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub steps: u32,
    pub calories_consumed: f64,
}

/// Derived per-day metrics. Recomputed on demand from the matching
/// [`DailyActivityRecord`]; never persisted or mutated independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnalytics {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub step_count: u32,
    pub calories_burned: f64,
    pub calories_consumed: f64,
    pub calorie_difference: f64,
    pub active_minutes: u32,
    pub distance_km: f64,
}

/// Goal metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    StepCount,
    ActiveMinutes,
    CalorieIntake,
    Distance,
    Weight,
}

/// Goal period granularity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    Daily,
    Weekly,
    Monthly,
}

/// Goal status lifecycle: pending -> active (first progress) -> completed
/// (target reached) or failed (period ended short of target).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

/// A generated fitness goal for one (user, type, timeframe) period.
///
/// Invariant: at most one goal per (user, type, timeframe) has an
/// `end_date` on or after today (the "active" one).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal_type: GoalType,
    pub time_frame: TimeFrame,
    pub target: f64,
    pub current: f64,
    pub status: GoalStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Consecutive completed periods for this type+timeframe.
    pub streak: u32,
    /// Target of the goal this one superseded, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_target: Option<f64>,
}

impl FitnessGoal {
    /// Whether this goal's period covers `today`.
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.end_date >= today
    }
}

/// Recommendation category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Exercise,
    Nutrition,
    Recovery,
    General,
}

/// Recommendation priority, ordered low < medium < high for retrieval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Time-of-day window for time-dependent recommendations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

/// A contextual suggestion produced by the recommendation rule pass.
///
/// Optional fields are omitted (not null) when absent so persisted
/// documents only carry the keys a rule actually set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessRecommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub completed: bool,
    pub weather_dependent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal_weather_condition: Option<WeatherCondition>,
    pub time_of_day_dependent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal_time_of_day: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Simplified weather condition vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
}

/// Cached weather snapshot feeding the recommendation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherContext {
    pub condition: WeatherCondition,
    pub temperature_c: f64,
    pub humidity: f64,
    pub wind_speed_ms: f64,
    pub is_outdoor_friendly: bool,
}

/// Static food corpus entry, read-only at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Declared training objective on the user profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FitnessObjective {
    WeightLoss,
    Maintenance,
    MuscleGain,
    Endurance,
}

/// User profile fields consumed by goal generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub fitness_goal: FitnessObjective,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_goal: Option<f64>,
}
