//! Analytics aggregation service
//!
//! Collapses raw per-day activity records into derived daily metrics.
//! Aggregation is a pure function of its input window: same-day entries sum,
//! dates without records are omitted, and output is ordered by date.

use crate::error::{EngineError, EngineResult};
use crate::store::ActivityRepository;
use chrono::NaiveDate;
use fitpulse_shared::{derive_analytics, DailyActivityRecord, UserAnalytics};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Collapse raw records into one [`UserAnalytics`] per calendar date.
///
/// Multiple log events for the same day are additive. The result is sorted
/// by date ascending.
pub fn aggregate(records: &[DailyActivityRecord]) -> Vec<UserAnalytics> {
    let mut by_date: BTreeMap<NaiveDate, (Uuid, u32, f64)> = BTreeMap::new();
    for record in records {
        let entry = by_date
            .entry(record.date)
            .or_insert((record.user_id, 0, 0.0));
        entry.1 += record.steps;
        entry.2 += record.calories_consumed;
    }

    by_date
        .into_iter()
        .map(|(date, (user_id, steps, consumed))| derive_analytics(user_id, date, steps, consumed))
        .collect()
}

/// Analytics service reading from the activity collection.
pub struct AnalyticsService {
    store: Arc<dyn ActivityRepository>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn ActivityRepository>) -> Self {
        Self { store }
    }

    /// Derived metrics for a user over `[from, to]`.
    pub async fn for_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<UserAnalytics>> {
        let records = self
            .store
            .range(user_id, from, to)
            .await
            .map_err(EngineError::Internal)?;
        Ok(aggregate(&records))
    }

    /// Derived metrics for the trailing `days` window ending at `today`.
    pub async fn last_days(
        &self,
        user_id: Uuid,
        days: u32,
        today: NaiveDate,
    ) -> EngineResult<Vec<UserAnalytics>> {
        let from = today - chrono::Duration::days(i64::from(days.saturating_sub(1)));
        self.for_range(user_id, from, today).await
    }
}
