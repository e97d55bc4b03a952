//! Recommendation generation service
//!
//! A pure rule-evaluation pass over active goals, last-7-days analytics,
//! current weather, and time-of-day. Each rule independently appends zero or
//! one recommendation; generation order across rule categories is stable
//! (steps, nutrition, weather, time-of-day, recovery) but carries no
//! semantic weight — retrieval orders by priority.
//!
//! Lifecycle: incomplete recommendations older than two days are purged
//! before every generation pass, unconditionally. Completion is a terminal
//! one-way transition; weather changes invalidate weather-dependent
//! recommendations whose ideal condition no longer holds.

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::services::analytics::aggregate;
use crate::store::DocumentStore;
use chrono::{DateTime, Datelike, Utc, Weekday};
use fitpulse_shared::{
    FitnessGoal, FitnessObjective, FitnessRecommendation, GoalType, Priority,
    RecommendationCategory, TimeFrame, TimeOfDay, UserAnalytics, UserProfile, WeatherCondition,
    WeatherContext,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Incomplete recommendations older than this many days are purged.
pub const STALE_AFTER_DAYS: i64 = 2;

/// Contextual recommendations expire a day after creation.
const CONTEXTUAL_TTL_HOURS: i64 = 24;

/// Everything the rule pass reads. Assembled by the service; pure to
/// evaluate.
pub struct RuleContext<'a> {
    pub user_id: Uuid,
    pub now: DateTime<Utc>,
    pub local_hour: u32,
    pub weekday: Weekday,
    /// Active daily step goal, if any.
    pub step_goal: Option<&'a FitnessGoal>,
    /// Active daily calorie-intake goal, if any.
    pub calorie_goal: Option<&'a FitnessGoal>,
    /// Last-7-days analytics, ascending by date.
    pub analytics: &'a [UserAnalytics],
    pub profile: Option<&'a UserProfile>,
    pub weather: &'a WeatherContext,
}

impl<'a> RuleContext<'a> {
    fn base(
        &self,
        title: &str,
        description: String,
        category: RecommendationCategory,
        priority: Priority,
    ) -> FitnessRecommendation {
        FitnessRecommendation {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            title: title.to_string(),
            description,
            category,
            priority,
            completed: false,
            weather_dependent: false,
            ideal_weather_condition: None,
            time_of_day_dependent: false,
            ideal_time_of_day: None,
            expires_at: None,
            created_at: self.now,
        }
    }

    fn weather_based(
        &self,
        title: &str,
        description: String,
        priority: Priority,
        ideal: Option<WeatherCondition>,
    ) -> FitnessRecommendation {
        let mut rec = self.base(title, description, RecommendationCategory::Exercise, priority);
        rec.weather_dependent = true;
        rec.ideal_weather_condition = ideal;
        rec.expires_at = Some(self.now + chrono::Duration::hours(CONTEXTUAL_TTL_HOURS));
        rec
    }
}

/// Evaluate the full rule table against a context.
pub fn evaluate_rules(ctx: &RuleContext<'_>) -> Vec<FitnessRecommendation> {
    let mut out = Vec::new();
    step_rules(ctx, &mut out);
    nutrition_rules(ctx, &mut out);
    weather_rules(ctx, &mut out);
    time_of_day_rule(ctx, &mut out);
    recovery_rules(ctx, &mut out);
    out
}

fn step_rules(ctx: &RuleContext<'_>, out: &mut Vec<FitnessRecommendation>) {
    if let Some(goal) = ctx.step_goal {
        if goal.current < goal.target * 0.5 && ctx.local_hour >= 12 {
            out.push(ctx.base(
                "Get moving",
                format!(
                    "You're at {:.0} of your {:.0} step goal with the day half over. A brisk walk would close the gap.",
                    goal.current, goal.target
                ),
                RecommendationCategory::Exercise,
                Priority::High,
            ));
        } else if goal.current >= goal.target * 0.8 && goal.current < goal.target {
            out.push(ctx.base(
                "Almost there",
                format!(
                    "Only {:.0} steps to go. Finish your step goal with a short stroll.",
                    goal.target - goal.current
                ),
                RecommendationCategory::Exercise,
                Priority::Medium,
            ));
        }
    }

    // Declining trend: each of the 3 most recent days strictly below the one
    // before it.
    let recent = ctx.analytics;
    if recent.len() >= 3 {
        let tail = &recent[recent.len() - 3..];
        if tail[0].step_count > tail[1].step_count && tail[1].step_count > tail[2].step_count {
            out.push(ctx.base(
                "Step count slipping",
                "Your daily steps have dropped three days in a row. Try scheduling a walk today."
                    .to_string(),
                RecommendationCategory::Exercise,
                Priority::Medium,
            ));
        }
    }
}

fn nutrition_rules(ctx: &RuleContext<'_>, out: &mut Vec<FitnessRecommendation>) {
    if let Some(goal) = ctx.calorie_goal {
        if goal.current > goal.target {
            out.push(ctx.base(
                "Over calorie budget",
                format!(
                    "You've logged {:.0} kcal against a {:.0} kcal target. Go lighter for the rest of the day.",
                    goal.current, goal.target
                ),
                RecommendationCategory::Nutrition,
                Priority::High,
            ));
        } else if goal.current < goal.target * 0.5 && ctx.local_hour >= 17 {
            out.push(ctx.base(
                "Fuel up",
                "You've eaten less than half your calorie target and it's getting late. Make sure dinner covers your needs.".to_string(),
                RecommendationCategory::Nutrition,
                Priority::Medium,
            ));
        }
    }

    let deficit_days = ctx
        .analytics
        .iter()
        .filter(|a| a.calories_burned > a.calories_consumed)
        .count();
    let weight_loss = ctx
        .profile
        .map_or(false, |p| p.fitness_goal == FitnessObjective::WeightLoss);
    if ctx.analytics.len() >= 5 && deficit_days >= 5 && weight_loss {
        out.push(ctx.base(
            "Deficit streak",
            "You've held a calorie deficit most of this week. Steady progress toward your weight goal.".to_string(),
            RecommendationCategory::Nutrition,
            Priority::Low,
        ));
    }
}

fn weather_rules(ctx: &RuleContext<'_>, out: &mut Vec<FitnessRecommendation>) {
    let w = ctx.weather;
    if w.is_outdoor_friendly {
        if w.condition == WeatherCondition::Sunny && w.temperature_c > 20.0 {
            out.push(ctx.weather_based(
                "Perfect day outside",
                format!(
                    "Sunny and {:.0} degC. Great conditions for an outdoor run or ride.",
                    w.temperature_c
                ),
                Priority::High,
                Some(WeatherCondition::Sunny),
            ));
        } else if w.condition == WeatherCondition::Cloudy && w.temperature_c > 15.0 {
            out.push(ctx.weather_based(
                "Good conditions for a walk",
                format!(
                    "Overcast but mild at {:.0} degC. A comfortable window for outdoor exercise.",
                    w.temperature_c
                ),
                Priority::Medium,
                Some(WeatherCondition::Cloudy),
            ));
        }
    } else if w.condition == WeatherCondition::Rainy {
        out.push(ctx.weather_based(
            "Rainy day workout",
            "Rain outside. Swap the walk for an indoor session: stairs, bodyweight circuit, or the gym.".to_string(),
            Priority::Medium,
            Some(WeatherCondition::Rainy),
        ));
    } else if w.temperature_c < 5.0 {
        out.push(ctx.weather_based(
            "Too cold out",
            format!(
                "It's {:.0} degC outside. Keep today's training indoors and warm up thoroughly.",
                w.temperature_c
            ),
            Priority::High,
            Some(w.condition),
        ));
    } else if w.temperature_c > 32.0 {
        out.push(ctx.weather_based(
            "Heat warning",
            format!(
                "It's {:.0} degC out there. Train indoors or wait for the evening cool-down.",
                w.temperature_c
            ),
            Priority::High,
            Some(w.condition),
        ));
    }
}

fn time_of_day_rule(ctx: &RuleContext<'_>, out: &mut Vec<FitnessRecommendation>) {
    let window = match ctx.local_hour {
        6..=10 => Some(TimeOfDay::Morning),
        12..=17 => Some(TimeOfDay::Afternoon),
        18..=21 => Some(TimeOfDay::Evening),
        _ => None,
    };
    let Some(window) = window else {
        return;
    };

    let (title, description, priority) = if ctx.weather.is_outdoor_friendly {
        match window {
            TimeOfDay::Morning => (
                "Morning kickstart",
                "Start the day with a walk outside; morning light helps your rhythm too.",
                Priority::Medium,
            ),
            TimeOfDay::Afternoon => (
                "Afternoon break",
                "Step outside for ten minutes to break up the afternoon.",
                Priority::Medium,
            ),
            TimeOfDay::Evening => (
                "Evening wind-down",
                "An easy outdoor stroll after dinner helps digestion and sleep.",
                Priority::Medium,
            ),
        }
    } else {
        match window {
            TimeOfDay::Morning => (
                "Morning kickstart",
                "Weather's not cooperating; a short indoor mobility routine starts the day well.",
                Priority::Low,
            ),
            TimeOfDay::Afternoon => (
                "Afternoon break",
                "Stretch or climb some stairs to break up the afternoon indoors.",
                Priority::Low,
            ),
            TimeOfDay::Evening => (
                "Evening wind-down",
                "Wind down with indoor stretching or yoga before bed.",
                Priority::Low,
            ),
        }
    };

    let mut rec = ctx.base(
        title,
        description.to_string(),
        RecommendationCategory::General,
        priority,
    );
    rec.time_of_day_dependent = true;
    rec.ideal_time_of_day = Some(window);
    rec.expires_at = Some(ctx.now + chrono::Duration::hours(CONTEXTUAL_TTL_HOURS));
    out.push(rec);
}

fn recovery_rules(ctx: &RuleContext<'_>, out: &mut Vec<FitnessRecommendation>) {
    if ctx.analytics.len() >= 3 {
        let tail = &ctx.analytics[ctx.analytics.len() - 3..];
        let avg_steps: f64 = tail.iter().map(|a| f64::from(a.step_count)).sum::<f64>() / 3.0;
        if avg_steps > 10_000.0 {
            out.push(ctx.base(
                "Recovery time",
                "Three big days in a row. Schedule lighter activity and some stretching to recover.".to_string(),
                RecommendationCategory::Recovery,
                Priority::Medium,
            ));
        }
    }

    if ctx.weather.temperature_c > 25.0 {
        let priority = if ctx.weather.temperature_c > 30.0 {
            Priority::High
        } else {
            Priority::Medium
        };
        let mut rec = ctx.base(
            "Stay hydrated",
            format!(
                "It's {:.0} degC today. Drink water regularly, especially around exercise.",
                ctx.weather.temperature_c
            ),
            RecommendationCategory::General,
            priority,
        );
        rec.weather_dependent = true;
        rec.expires_at = Some(ctx.now + chrono::Duration::hours(CONTEXTUAL_TTL_HOURS));
        out.push(rec);
    }

    if matches!(ctx.weekday, Weekday::Sat | Weekday::Sun) {
        out.push(ctx.base(
            "Weekend recovery",
            "Use the weekend for active recovery: easy movement, mobility work, and sleep.".to_string(),
            RecommendationCategory::Recovery,
            Priority::Low,
        ));
    }
}

/// Recommendation generation and lifecycle service.
pub struct RecommendationService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Purge stale incomplete recommendations, evaluate the rule pass
    /// against fresh context, and persist the new batch.
    pub async fn generate_for_user(
        &self,
        user_id: Uuid,
        weather: &WeatherContext,
    ) -> EngineResult<Vec<FitnessRecommendation>> {
        // Cleanup runs regardless of how generation itself turns out.
        self.purge_stale(user_id).await?;

        let now = self.clock.now();
        let today = self.clock.today();
        let from = today - chrono::Duration::days(6);

        let records = self
            .store
            .range(user_id, from, today)
            .await
            .map_err(EngineError::Internal)?;
        let analytics = aggregate(&records);

        let step_goal = self
            .store
            .active_for(user_id, GoalType::StepCount, TimeFrame::Daily, today)
            .await
            .map_err(EngineError::Internal)?;
        let calorie_goal = self
            .store
            .active_for(user_id, GoalType::CalorieIntake, TimeFrame::Daily, today)
            .await
            .map_err(EngineError::Internal)?;
        let profile = self
            .store
            .profile(user_id)
            .await
            .map_err(EngineError::Internal)?;

        let ctx = RuleContext {
            user_id,
            now,
            local_hour: self.clock.hour(),
            weekday: today.weekday(),
            step_goal: step_goal.as_ref(),
            calorie_goal: calorie_goal.as_ref(),
            analytics: &analytics,
            profile: profile.as_ref(),
            weather,
        };

        let recommendations = evaluate_rules(&ctx);
        debug!(%user_id, count = recommendations.len(), "rule pass complete");

        futures::future::try_join_all(
            recommendations
                .iter()
                .cloned()
                .map(|r| self.store.put_recommendation(r)),
        )
        .await
        .map_err(EngineError::Internal)?;

        Ok(recommendations)
    }

    /// Delete incomplete recommendations older than [`STALE_AFTER_DAYS`].
    pub async fn purge_stale(&self, user_id: Uuid) -> EngineResult<usize> {
        let cutoff = self.clock.now() - chrono::Duration::days(STALE_AFTER_DAYS);
        let stale = self
            .store
            .incomplete_older_than(user_id, cutoff)
            .await
            .map_err(EngineError::Internal)?;

        let count = stale.len();
        for rec in stale {
            self.store
                .delete_recommendation(rec.id)
                .await
                .map_err(EngineError::Internal)?;
        }
        if count > 0 {
            info!(%user_id, count, "purged stale recommendations");
        }
        Ok(count)
    }

    /// Incomplete, unexpired recommendations ordered high priority first.
    pub async fn active(&self, user_id: Uuid) -> EngineResult<Vec<FitnessRecommendation>> {
        self.store
            .active(user_id, self.clock.now())
            .await
            .map_err(EngineError::Internal)
    }

    /// Terminal one-way completion.
    pub async fn mark_completed(&self, id: Uuid) -> EngineResult<bool> {
        self.store
            .mark_completed(id)
            .await
            .map_err(EngineError::Internal)
    }

    /// Complete weather-dependent recommendations whose ideal condition no
    /// longer matches the new context. Returns how many were invalidated.
    pub async fn invalidate_weather_dependent(
        &self,
        user_id: Uuid,
        weather: &WeatherContext,
    ) -> EngineResult<usize> {
        let active = self.active(user_id).await?;
        let mut invalidated = 0;
        for rec in active {
            let stale = rec.weather_dependent
                && rec
                    .ideal_weather_condition
                    .map_or(false, |ideal| ideal != weather.condition);
            if stale {
                self.mark_completed(rec.id).await?;
                invalidated += 1;
            }
        }
        if invalidated > 0 {
            info!(%user_id, invalidated, "invalidated weather-dependent recommendations");
        }
        Ok(invalidated)
    }
}
