//! Dashboard and analytics reads.
//!
//! Every method is owner-scoped and infallible from the caller's point of
//! view: a store error is logged with `tracing::warn!` and the method
//! returns an empty or sample default.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tourflow_core::analytics::{
    self, DailyViews, EngagementMetrics, StepFunnel, StepPerformance, TourEvent, STEP_CHART_LIMIT,
    STEP_COMPLETED, STEP_SKIPPED, STEP_VIEWED, TOUR_COMPLETED, TOUR_STARTED,
};
use tourflow_core::tour::TourStatus;
use tourflow_core::types::{DbId, OwnerId, Timestamp};

use crate::models::analytics::AnalyticsEventRow;
use crate::models::tour::RecentTour;
use crate::store::TourStore;
use crate::DbResult;

/// Number of tours the dashboard's recent list shows.
pub const RECENT_TOURS_LIMIT: i64 = 3;

/// Header numbers for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardStats {
    pub total_tours: i64,
    pub active_tours: i64,
    pub total_steps: i64,
    pub total_users: i64,
}

/// One slice of the tour status pie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub name: &'static str,
    pub value: u64,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn TourStore>,
}

/// Unwrap an aggregation result, logging and substituting `fallback` on error.
fn or_default<T>(result: DbResult<T>, panel: &'static str, owner: OwnerId, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(panel, %owner, error = %e, "Dashboard query failed, using default");
            fallback
        }
    }
}

/// Parse raw rows, dropping the ones that do not describe a known event.
fn parse_events(rows: &[AnalyticsEventRow]) -> Vec<TourEvent> {
    rows.iter()
        .filter_map(|row| match row.to_event() {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(event_id = row.id, error = %e, "Skipping unparseable event");
                None
            }
        })
        .collect()
}

impl DashboardService {
    pub fn new(store: Arc<dyn TourStore>) -> Self {
        Self { store }
    }

    async fn owner_tour_ids(&self, owner: OwnerId) -> DbResult<Vec<DbId>> {
        Ok(self
            .store
            .list_tours(owner)
            .await?
            .iter()
            .map(|t| t.id)
            .collect())
    }

    async fn owner_events(
        &self,
        owner: OwnerId,
        types: &[&str],
        since: Option<Timestamp>,
    ) -> DbResult<Vec<TourEvent>> {
        let tour_ids = self.owner_tour_ids(owner).await?;
        if tour_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.store.list_events(&tour_ids, types, since).await?;
        Ok(parse_events(&rows))
    }

    async fn load_stats(&self, owner: OwnerId) -> DbResult<DashboardStats> {
        let totals = self.store.tour_totals(owner).await?;
        let total_users = self.store.count_profiles().await?;
        Ok(DashboardStats {
            total_tours: totals.total_tours,
            active_tours: totals.active_tours,
            total_steps: totals.total_steps,
            total_users,
        })
    }

    async fn load_step_rates(&self, owner: OwnerId) -> DbResult<Vec<(i32, f64)>> {
        let tour_ids = self.owner_tour_ids(owner).await?;
        if tour_ids.is_empty() {
            return Ok(Vec::new());
        }
        let steps = self.store.list_steps_for_tours(&tour_ids).await?;
        Ok(steps.iter().map(|s| (s.step_order, s.completion_rate)).collect())
    }

    /// `None` when the tenant has no tours.
    async fn load_weekly_starts(
        &self,
        owner: OwnerId,
        now: Timestamp,
    ) -> DbResult<Option<Vec<TourEvent>>> {
        let tour_ids = self.owner_tour_ids(owner).await?;
        if tour_ids.is_empty() {
            return Ok(None);
        }
        let since = now - Duration::days(7);
        let rows = self
            .store
            .list_events(&tour_ids, &[TOUR_STARTED], Some(since))
            .await?;
        Ok(Some(parse_events(&rows)))
    }

    async fn load_step_funnel(&self, owner: OwnerId) -> DbResult<Vec<StepFunnel>> {
        let tours = self.store.list_tours(owner).await?;
        let max_steps = tours.iter().map(|t| t.total_steps).max().unwrap_or(0);
        let step_count = usize::try_from(max_steps).unwrap_or(0).min(STEP_CHART_LIMIT);
        if step_count == 0 {
            return Ok(Vec::new());
        }

        let tour_ids: Vec<DbId> = tours.iter().map(|t| t.id).collect();
        let rows = self
            .store
            .list_events(&tour_ids, &[STEP_VIEWED, STEP_COMPLETED, STEP_SKIPPED], None)
            .await?;
        Ok(analytics::step_funnel(&parse_events(&rows), step_count))
    }

    pub async fn stats(&self, owner: OwnerId) -> DashboardStats {
        let result = self.load_stats(owner).await;
        or_default(result, "stats", owner, DashboardStats::default())
    }

    /// The newest tours, at most `limit`.
    pub async fn recent_tours(&self, owner: OwnerId, limit: i64) -> Vec<RecentTour> {
        let result = self.store.list_recent_tours(owner, limit.max(0)).await;
        or_default(result, "recent_tours", owner, Vec::new())
    }

    /// Average completion rate per step position, or the sample series when
    /// the tenant has no steps or the read fails.
    pub async fn average_step_performance(&self, owner: OwnerId) -> Vec<StepPerformance> {
        let result = self.load_step_rates(owner).await;
        let rates = or_default(result, "step_performance", owner, Vec::new());
        analytics::average_step_performance(&rates)
    }

    /// Tour starts over the seven days before `now`, Monday first.
    pub async fn weekly_views(&self, owner: OwnerId, now: Timestamp) -> Vec<DailyViews> {
        let result = self.load_weekly_starts(owner, now).await;

        match or_default(result, "weekly_views", owner, None) {
            Some(events) => analytics::weekly_views(&events, now),
            None => Vec::new(),
        }
    }

    /// Per-step view, completion and skip counts for the first
    /// `min(max total_steps, 5)` steps.
    pub async fn step_funnel(&self, owner: OwnerId) -> Vec<StepFunnel> {
        let result = self.load_step_funnel(owner).await;
        or_default(result, "step_funnel", owner, Vec::new())
    }

    pub async fn metrics(&self, owner: OwnerId) -> EngagementMetrics {
        let result = self
            .owner_events(owner, &[TOUR_STARTED, TOUR_COMPLETED], None)
            .await;
        let events = or_default(result, "metrics", owner, Vec::new());
        analytics::engagement_metrics(&events)
    }

    /// Active and inactive tour counts; empty when the tenant has no tours.
    pub async fn tour_status_breakdown(&self, owner: OwnerId) -> Vec<StatusCount> {
        let result = self.store.list_tours(owner).await;
        let tours = or_default(result, "tour_status", owner, Vec::new());
        if tours.is_empty() {
            return Vec::new();
        }

        let active = tours.iter().filter(|t| t.status.is_active()).count() as u64;
        vec![
            StatusCount {
                name: TourStatus::Active.as_str(),
                value: active,
            },
            StatusCount {
                name: TourStatus::Inactive.as_str(),
                value: tours.len() as u64 - active,
            },
        ]
    }
}
