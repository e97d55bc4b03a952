//! Document store collaborators
//!
//! The engine depends on abstract per-collection repositories rather than a
//! concrete backing store. Each trait exposes only the query primitives the
//! services need (equality/range filters, ordering, limits); wire-format and
//! protocol details belong to implementations.

pub mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fitpulse_shared::{
    DailyActivityRecord, FitnessGoal, FitnessRecommendation, GoalType, TimeFrame, UserProfile,
};
use uuid::Uuid;

/// Activity/day record collection.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Record activity for a day. Same-day entries are additive: steps and
    /// consumed calories sum into the existing record.
    async fn log(&self, record: DailyActivityRecord) -> Result<DailyActivityRecord>;

    /// Records for a user within `[from, to]`, ordered by date ascending.
    /// Days without records are absent, not zero-filled.
    async fn range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyActivityRecord>>;
}

/// Goal record collection.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Write a goal keyed by its own id. Re-putting the same id overwrites,
    /// which makes period regeneration idempotent.
    async fn put_goal(&self, goal: FitnessGoal) -> Result<()>;

    async fn goal(&self, id: Uuid) -> Result<Option<FitnessGoal>>;

    /// The goal for (user, type, timeframe) whose period still covers
    /// `today`, picking the latest end_date when several match.
    async fn active_for(
        &self,
        user_id: Uuid,
        goal_type: GoalType,
        time_frame: TimeFrame,
        today: NaiveDate,
    ) -> Result<Option<FitnessGoal>>;

    /// All goals for a user whose end_date is on or after `today`.
    async fn all_active(&self, user_id: Uuid, today: NaiveDate) -> Result<Vec<FitnessGoal>>;

    async fn delete_goal(&self, id: Uuid) -> Result<bool>;
}

/// Recommendation record collection.
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    async fn put_recommendation(&self, recommendation: FitnessRecommendation) -> Result<()>;

    /// Incomplete, unexpired recommendations for a user, high priority first.
    async fn active(&self, user_id: Uuid, now: DateTime<Utc>)
        -> Result<Vec<FitnessRecommendation>>;

    /// Incomplete recommendations created before `cutoff`.
    async fn incomplete_older_than(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<FitnessRecommendation>>;

    /// Terminal one-way transition; returns false when already completed or
    /// missing.
    async fn mark_completed(&self, id: Uuid) -> Result<bool>;

    async fn delete_recommendation(&self, id: Uuid) -> Result<bool>;
}

/// User profile collection.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> Result<Option<UserProfile>>;
    async fn put_profile(&self, profile: UserProfile) -> Result<()>;
}

/// Full document-store surface the composition root wires in.
pub trait DocumentStore:
    ActivityRepository + GoalRepository + RecommendationRepository + ProfileRepository
{
}

impl<T> DocumentStore for T where
    T: ActivityRepository + GoalRepository + RecommendationRepository + ProfileRepository
{
}
