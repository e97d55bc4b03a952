//! Goal generation service
//!
//! Produces daily/weekly/monthly targets from 30 days of analytics and the
//! user profile, with adaptive difficulty: completing the prior period's
//! goal earns a larger growth bump on the next one.
//!
//! Generation is all-or-nothing: any failure aborts the whole call with a
//! tagged error so callers never observe a partial goal set. Goal ids are
//! deterministic per (user, type, timeframe, period start), so re-running
//! generation for the same period overwrites instead of duplicating.

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::services::analytics::aggregate;
use crate::store::DocumentStore;
use chrono::{Datelike, Days, NaiveDate};
use fitpulse_shared::{
    FitnessGoal, FitnessObjective, GoalStatus, GoalType, TimeFrame, UserAnalytics, UserProfile,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Fallback daily step target with no history.
pub const DEFAULT_DAILY_STEPS: f64 = 8000.0;
/// Hard ceiling on the daily step target.
pub const MAX_DAILY_STEPS: f64 = 15000.0;
/// Baseline growth factor on the historical average.
pub const STEP_GROWTH: f64 = 1.05;
/// Growth factor when the superseded goal was completed. Replaces the
/// baseline bump, never stacks on it.
pub const STEP_COMPLETION_GROWTH: f64 = 1.10;
/// Weekly targets get a buffer discount off seven dailies.
pub const WEEKLY_BUFFER: f64 = 0.9;
/// Buffer applied to the no-history monthly default.
pub const MONTHLY_DEFAULT_BUFFER: f64 = 0.9;

/// Fallback daily calorie-intake target.
pub const DEFAULT_CALORIE_INTAKE: f64 = 2000.0;
/// Safety floor under the deficit-adjusted intake target.
pub const MIN_CALORIE_INTAKE: f64 = 1200.0;
/// Deficit subtracted from average burn for weight-loss users.
pub const CALORIE_DEFICIT: f64 = 500.0;

/// Default daily active minutes.
pub const DEFAULT_DAILY_ACTIVE_MINUTES: f64 = 30.0;
/// Default weekly active minutes.
pub const DEFAULT_WEEKLY_ACTIVE_MINUTES: f64 = 150.0;

/// Safe ceiling on weight lost per monthly goal, in kg.
pub const MAX_MONTHLY_WEIGHT_LOSS_KG: f64 = 2.0;
/// Weight-loss pace in kg per remaining day of the month.
pub const DAILY_WEIGHT_LOSS_KG: f64 = 0.1;

const KM_PER_STEP: f64 = fitpulse_shared::activity_metrics::KM_PER_STEP;

/// Averages over the available analytics window.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryStats {
    pub avg_steps: Option<f64>,
    pub avg_calories_burned: Option<f64>,
}

/// Compute window averages; `None` when no history is present.
pub fn history_stats(analytics: &[UserAnalytics]) -> HistoryStats {
    if analytics.is_empty() {
        return HistoryStats::default();
    }
    let days = analytics.len() as f64;
    let steps: f64 = analytics.iter().map(|a| f64::from(a.step_count)).sum();
    let burned: f64 = analytics.iter().map(|a| a.calories_burned).sum();
    HistoryStats {
        avg_steps: Some(steps / days),
        avg_calories_burned: Some(burned / days),
    }
}

/// Daily step target: historical average with a growth bump, capped at
/// [`MAX_DAILY_STEPS`]. Growth only applies to a real average; without
/// usable history the default stands as-is.
pub fn daily_step_target(avg_steps: Option<f64>, prior_completed: bool) -> f64 {
    let base = match avg_steps {
        Some(avg) if avg > 0.0 => avg,
        _ => return DEFAULT_DAILY_STEPS,
    };
    let growth = if prior_completed {
        STEP_COMPLETION_GROWTH
    } else {
        STEP_GROWTH
    };
    (base * growth).round().min(MAX_DAILY_STEPS)
}

/// Weekly step target: seven dailies with a buffer discount.
pub fn weekly_step_target(daily_target: f64) -> f64 {
    (daily_target * 7.0 * WEEKLY_BUFFER).round()
}

/// Monthly step target over the remaining days of the month.
pub fn monthly_step_target(avg_steps: Option<f64>, remaining_days: u32) -> f64 {
    let remaining = f64::from(remaining_days);
    match avg_steps {
        Some(avg) => (avg * remaining * STEP_GROWTH).round(),
        None => (DEFAULT_DAILY_STEPS * remaining * MONTHLY_DEFAULT_BUFFER).round(),
    }
}

/// Daily calorie-intake target.
///
/// Weight-loss users with enough burn history to sustain a deficit get
/// `max(1200, avg_burned - 500)`; everyone else keeps their declared goal
/// (or 2000 without one).
pub fn calorie_intake_target(profile: &UserProfile, avg_calories_burned: Option<f64>) -> f64 {
    let declared = profile.daily_calorie_goal.unwrap_or(DEFAULT_CALORIE_INTAKE);
    if profile.fitness_goal != FitnessObjective::WeightLoss {
        return declared;
    }
    match avg_calories_burned {
        Some(burned) if burned > CALORIE_DEFICIT => {
            (burned - CALORIE_DEFICIT).max(MIN_CALORIE_INTAKE).round()
        }
        _ => declared,
    }
}

/// Daily active-minutes target, scaled up for weight loss.
pub fn daily_active_minutes_target(weight_loss: bool) -> f64 {
    if weight_loss {
        DEFAULT_DAILY_ACTIVE_MINUTES * 1.5
    } else {
        DEFAULT_DAILY_ACTIVE_MINUTES
    }
}

/// Weekly active-minutes target, scaled up for weight loss.
pub fn weekly_active_minutes_target(weight_loss: bool) -> f64 {
    if weight_loss {
        DEFAULT_WEEKLY_ACTIVE_MINUTES * 1.3
    } else {
        DEFAULT_WEEKLY_ACTIVE_MINUTES
    }
}

/// Monthly distance target in km, derived from the monthly step target via
/// average stride length.
pub fn distance_target_km(monthly_step_target: f64) -> f64 {
    monthly_step_target * KM_PER_STEP
}

/// Monthly weight target: bounded loss of at most
/// [`MAX_MONTHLY_WEIGHT_LOSS_KG`] regardless of remaining days.
pub fn weight_target(current_weight_kg: f64, remaining_days: u32) -> f64 {
    let loss = (f64::from(remaining_days) * DAILY_WEIGHT_LOSS_KG).min(MAX_MONTHLY_WEIGHT_LOSS_KG);
    current_weight_kg - loss
}

/// Days from `today` through the end of its month, inclusive.
pub fn remaining_days_in_month(today: NaiveDate) -> u32 {
    let next_month = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    };
    // Both dates are valid by construction.
    let last_day = next_month
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(today);
    (last_day - today).num_days() as u32 + 1
}

/// Period bounds for a goal starting today.
pub fn period_bounds(time_frame: TimeFrame, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match time_frame {
        TimeFrame::Daily => (today, today),
        TimeFrame::Weekly => (today, today + chrono::Duration::days(6)),
        TimeFrame::Monthly => {
            let end = today + chrono::Duration::days(i64::from(remaining_days_in_month(today)) - 1);
            (today, end)
        }
    }
}

/// Deterministic goal id for one (user, type, timeframe, period). Stable
/// across regeneration so repeated runs overwrite the same document.
pub fn goal_id(
    user_id: Uuid,
    goal_type: GoalType,
    time_frame: TimeFrame,
    start_date: NaiveDate,
) -> Uuid {
    let key = format!("{user_id}:{goal_type:?}:{time_frame:?}:{start_date}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

/// Apply a progress value to a goal, driving the status lifecycle:
/// pending -> active on first progress, -> completed once the target is
/// reached (incrementing the streak exactly once).
pub fn apply_progress(goal: &mut FitnessGoal, current: f64) {
    goal.current = current;
    if goal.status == GoalStatus::Pending && current > 0.0 {
        goal.status = GoalStatus::Active;
    }
    if goal.status == GoalStatus::Active && current >= goal.target {
        goal.status = GoalStatus::Completed;
        goal.streak += 1;
    }
}

/// Fail a goal whose period ended short of its target; failing resets the
/// streak. Returns true when the goal transitioned.
pub fn expire_if_due(goal: &mut FitnessGoal, today: NaiveDate) -> bool {
    if goal.end_date < today
        && goal.current < goal.target
        && !matches!(goal.status, GoalStatus::Completed | GoalStatus::Failed)
    {
        goal.status = GoalStatus::Failed;
        goal.streak = 0;
        return true;
    }
    false
}

/// Prior goals found for each slot being regenerated.
#[derive(Debug, Clone, Default)]
struct PriorGoal {
    completed: bool,
    streak: u32,
    target: Option<f64>,
}

impl PriorGoal {
    fn from(goal: Option<&FitnessGoal>) -> Self {
        match goal {
            Some(g) => Self {
                completed: g.status == GoalStatus::Completed,
                streak: g.streak,
                target: Some(g.target),
            },
            None => Self::default(),
        }
    }
}

/// Goal generation and progress service.
pub struct GoalService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl GoalService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Generate and persist a fresh goal set for all timeframes.
    ///
    /// Fails atomically: a missing profile surfaces as `NotFound`, any other
    /// failure as a tagged `GoalGeneration` error. Partial sets are never
    /// reported as success.
    pub async fn generate_for_user(&self, user_id: Uuid) -> EngineResult<Vec<FitnessGoal>> {
        let today = self.clock.today();

        let profile = self
            .store
            .profile(user_id)
            .await
            .map_err(EngineError::Internal)?
            .ok_or_else(|| EngineError::NotFound(format!("profile for user {user_id}")))?;

        let goals = self
            .build_goal_set(&profile, today)
            .await
            .map_err(|source| EngineError::GoalGeneration { user_id, source })?;

        // Disjoint keys, so the writes can fan out unordered.
        futures::future::try_join_all(goals.iter().cloned().map(|g| self.store.put_goal(g)))
            .await
            .map_err(|source| EngineError::GoalGeneration { user_id, source })?;

        info!(%user_id, count = goals.len(), "generated goal set");
        Ok(goals)
    }

    async fn build_goal_set(
        &self,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> anyhow::Result<Vec<FitnessGoal>> {
        let from = today - chrono::Duration::days(29);
        let records = self.store.range(profile.user_id, from, today).await?;
        let analytics = aggregate(&records);
        let stats = history_stats(&analytics);
        let weight_loss = profile.fitness_goal == FitnessObjective::WeightLoss;

        debug!(
            user_id = %profile.user_id,
            history_days = analytics.len(),
            avg_steps = ?stats.avg_steps,
            "building goal set"
        );

        let mut goals = Vec::new();

        // Daily: steps, calorie intake, active minutes.
        let prior = self
            .prior(profile.user_id, GoalType::StepCount, TimeFrame::Daily, today)
            .await?;
        let daily_steps = daily_step_target(stats.avg_steps, prior.completed);
        goals.push(self.make_goal(
            profile.user_id,
            GoalType::StepCount,
            TimeFrame::Daily,
            daily_steps,
            &prior,
            today,
        ));

        let prior = self
            .prior(profile.user_id, GoalType::CalorieIntake, TimeFrame::Daily, today)
            .await?;
        goals.push(self.make_goal(
            profile.user_id,
            GoalType::CalorieIntake,
            TimeFrame::Daily,
            calorie_intake_target(profile, stats.avg_calories_burned),
            &prior,
            today,
        ));

        let prior = self
            .prior(profile.user_id, GoalType::ActiveMinutes, TimeFrame::Daily, today)
            .await?;
        goals.push(self.make_goal(
            profile.user_id,
            GoalType::ActiveMinutes,
            TimeFrame::Daily,
            daily_active_minutes_target(weight_loss),
            &prior,
            today,
        ));

        // Weekly: steps, active minutes.
        let prior = self
            .prior(profile.user_id, GoalType::StepCount, TimeFrame::Weekly, today)
            .await?;
        goals.push(self.make_goal(
            profile.user_id,
            GoalType::StepCount,
            TimeFrame::Weekly,
            weekly_step_target(daily_steps),
            &prior,
            today,
        ));

        let prior = self
            .prior(profile.user_id, GoalType::ActiveMinutes, TimeFrame::Weekly, today)
            .await?;
        goals.push(self.make_goal(
            profile.user_id,
            GoalType::ActiveMinutes,
            TimeFrame::Weekly,
            weekly_active_minutes_target(weight_loss),
            &prior,
            today,
        ));

        // Monthly: steps, distance, and weight when applicable.
        let remaining = remaining_days_in_month(today);
        let monthly_steps = monthly_step_target(stats.avg_steps, remaining);
        let prior = self
            .prior(profile.user_id, GoalType::StepCount, TimeFrame::Monthly, today)
            .await?;
        goals.push(self.make_goal(
            profile.user_id,
            GoalType::StepCount,
            TimeFrame::Monthly,
            monthly_steps,
            &prior,
            today,
        ));

        let prior = self
            .prior(profile.user_id, GoalType::Distance, TimeFrame::Monthly, today)
            .await?;
        goals.push(self.make_goal(
            profile.user_id,
            GoalType::Distance,
            TimeFrame::Monthly,
            distance_target_km(monthly_steps),
            &prior,
            today,
        ));

        if weight_loss {
            if let Some(weight_kg) = profile.weight_kg {
                let prior = self
                    .prior(profile.user_id, GoalType::Weight, TimeFrame::Monthly, today)
                    .await?;
                goals.push(self.make_goal(
                    profile.user_id,
                    GoalType::Weight,
                    TimeFrame::Monthly,
                    weight_target(weight_kg, remaining),
                    &prior,
                    today,
                ));
            }
        }

        Ok(goals)
    }

    async fn prior(
        &self,
        user_id: Uuid,
        goal_type: GoalType,
        time_frame: TimeFrame,
        today: NaiveDate,
    ) -> anyhow::Result<PriorGoal> {
        let existing = self
            .store
            .active_for(user_id, goal_type, time_frame, today)
            .await?;
        Ok(PriorGoal::from(existing.as_ref()))
    }

    fn make_goal(
        &self,
        user_id: Uuid,
        goal_type: GoalType,
        time_frame: TimeFrame,
        target: f64,
        prior: &PriorGoal,
        today: NaiveDate,
    ) -> FitnessGoal {
        let (start_date, end_date) = period_bounds(time_frame, today);
        FitnessGoal {
            id: goal_id(user_id, goal_type, time_frame, start_date),
            user_id,
            goal_type,
            time_frame,
            target,
            current: 0.0,
            status: GoalStatus::Pending,
            start_date,
            end_date,
            streak: prior.streak,
            previous_target: prior.target,
        }
    }

    /// Record synced progress against a goal, persisting any status
    /// transition it causes.
    pub async fn sync_progress(&self, goal_id: Uuid, current: f64) -> EngineResult<FitnessGoal> {
        let mut goal = self
            .store
            .goal(goal_id)
            .await
            .map_err(EngineError::Internal)?
            .ok_or_else(|| EngineError::NotFound(format!("goal {goal_id}")))?;

        apply_progress(&mut goal, current);
        self.store
            .put_goal(goal.clone())
            .await
            .map_err(EngineError::Internal)?;
        Ok(goal)
    }

    /// Fail overdue goals for a user. Returns the goals that transitioned.
    pub async fn expire_overdue(&self, user_id: Uuid) -> EngineResult<Vec<FitnessGoal>> {
        let today = self.clock.today();
        // Look back far enough to catch goals whose period just ended.
        let candidates = self
            .store
            .all_active(user_id, today - chrono::Duration::days(31))
            .await
            .map_err(EngineError::Internal)?;

        let mut expired = Vec::new();
        for mut goal in candidates {
            if expire_if_due(&mut goal, today) {
                self.store
                    .put_goal(goal.clone())
                    .await
                    .map_err(EngineError::Internal)?;
                expired.push(goal);
            }
        }
        Ok(expired)
    }
}
