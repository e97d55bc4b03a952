//! In-memory document store
//!
//! Process-local implementation of the store collaborators. Backs the
//! engine when no remote store is configured and doubles as the test store.

use super::{ActivityRepository, GoalRepository, ProfileRepository, RecommendationRepository};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fitpulse_shared::{
    DailyActivityRecord, FitnessGoal, FitnessRecommendation, GoalType, TimeFrame, UserProfile,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store over per-collection hash maps.
#[derive(Default)]
pub struct MemoryStore {
    activity: RwLock<HashMap<(Uuid, NaiveDate), DailyActivityRecord>>,
    goals: RwLock<HashMap<Uuid, FitnessGoal>>,
    recommendations: RwLock<HashMap<Uuid, FitnessRecommendation>>,
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn log(&self, record: DailyActivityRecord) -> Result<DailyActivityRecord> {
        let mut activity = self.activity.write().await;
        let entry = activity
            .entry((record.user_id, record.date))
            .and_modify(|existing| {
                existing.steps += record.steps;
                existing.calories_consumed += record.calories_consumed;
            })
            .or_insert(record);
        Ok(entry.clone())
    }

    async fn range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyActivityRecord>> {
        let activity = self.activity.read().await;
        let mut records: Vec<DailyActivityRecord> = activity
            .values()
            .filter(|r| r.user_id == user_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }
}

#[async_trait]
impl GoalRepository for MemoryStore {
    async fn put_goal(&self, goal: FitnessGoal) -> Result<()> {
        self.goals.write().await.insert(goal.id, goal);
        Ok(())
    }

    async fn goal(&self, id: Uuid) -> Result<Option<FitnessGoal>> {
        Ok(self.goals.read().await.get(&id).cloned())
    }

    async fn active_for(
        &self,
        user_id: Uuid,
        goal_type: GoalType,
        time_frame: TimeFrame,
        today: NaiveDate,
    ) -> Result<Option<FitnessGoal>> {
        let goals = self.goals.read().await;
        let candidate = goals
            .values()
            .filter(|g| {
                g.user_id == user_id
                    && g.goal_type == goal_type
                    && g.time_frame == time_frame
                    && g.end_date >= today
            })
            .max_by_key(|g| g.end_date)
            .cloned();
        Ok(candidate)
    }

    async fn all_active(&self, user_id: Uuid, today: NaiveDate) -> Result<Vec<FitnessGoal>> {
        let goals = self.goals.read().await;
        let mut active: Vec<FitnessGoal> = goals
            .values()
            .filter(|g| g.user_id == user_id && g.end_date >= today)
            .cloned()
            .collect();
        active.sort_by_key(|g| (g.end_date, g.id));
        Ok(active)
    }

    async fn delete_goal(&self, id: Uuid) -> Result<bool> {
        Ok(self.goals.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl RecommendationRepository for MemoryStore {
    async fn put_recommendation(&self, recommendation: FitnessRecommendation) -> Result<()> {
        self.recommendations
            .write()
            .await
            .insert(recommendation.id, recommendation);
        Ok(())
    }

    async fn active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<FitnessRecommendation>> {
        let recommendations = self.recommendations.read().await;
        let mut active: Vec<FitnessRecommendation> = recommendations
            .values()
            .filter(|r| {
                r.user_id == user_id
                    && !r.completed
                    && r.expires_at.map_or(true, |expiry| expiry > now)
            })
            .cloned()
            .collect();
        active.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.created_at.cmp(&b.created_at)));
        Ok(active)
    }

    async fn incomplete_older_than(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<FitnessRecommendation>> {
        let recommendations = self.recommendations.read().await;
        Ok(recommendations
            .values()
            .filter(|r| r.user_id == user_id && !r.completed && r.created_at < cutoff)
            .cloned()
            .collect())
    }

    async fn mark_completed(&self, id: Uuid) -> Result<bool> {
        let mut recommendations = self.recommendations.write().await;
        match recommendations.get_mut(&id) {
            Some(rec) if !rec.completed => {
                rec.completed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_recommendation(&self, id: Uuid) -> Result<bool> {
        Ok(self.recommendations.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn put_profile(&self, profile: UserProfile) -> Result<()> {
        self.profiles.write().await.insert(profile.user_id, profile);
        Ok(())
    }
}
