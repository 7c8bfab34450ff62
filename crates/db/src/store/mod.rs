//! The persistence seam the services are built on.
//!
//! [`TourStore`] is object-safe and injected as `Arc<dyn TourStore>`, so the
//! lifecycle and dashboard logic run unchanged against Postgres
//! ([`PgTourStore`]) or the in-memory store used by tests
//! ([`MemoryTourStore`]).
//!
//! Methods map one-to-one onto single statements. Anything spanning more
//! than one call is composed in [`crate::lifecycle`].

use async_trait::async_trait;
use tourflow_core::types::{DbId, OwnerId, Timestamp};

use crate::models::analytics::{AnalyticsEventRow, CreateAnalyticsEvent};
use crate::models::profile::{Profile, UpsertProfile};
use crate::models::step::{NewStep, TourStep, UpdateStep};
use crate::models::tour::{NewTour, RecentTour, StepCountDrift, Tour, TourTotals, UpdateTour};
use crate::DbResult;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryTourStore, StoreOp};
pub use postgres::PgTourStore;

#[async_trait]
pub trait TourStore: Send + Sync {
    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> DbResult<()>;

    // ── Tours ────────────────────────────────────────────────────────

    async fn insert_tour(&self, owner: OwnerId, tour: &NewTour) -> DbResult<Tour>;

    /// Unscoped lookup for the public widget path.
    async fn find_tour(&self, tour_id: DbId) -> DbResult<Option<Tour>>;

    async fn find_owned_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<Option<Tour>>;

    /// Newest first.
    async fn list_tours(&self, owner: OwnerId) -> DbResult<Vec<Tour>>;

    async fn list_recent_tours(&self, owner: OwnerId, limit: i64) -> DbResult<Vec<RecentTour>>;

    async fn tour_totals(&self, owner: OwnerId) -> DbResult<TourTotals>;

    async fn update_tour(
        &self,
        tour_id: DbId,
        owner: OwnerId,
        input: &UpdateTour,
    ) -> DbResult<Option<Tour>>;

    async fn set_total_steps(&self, tour_id: DbId, total: i32) -> DbResult<bool>;

    /// Removes the tour's steps and events along with it.
    async fn delete_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<bool>;

    async fn find_step_count_drift(&self) -> DbResult<Vec<StepCountDrift>>;

    // ── Steps ────────────────────────────────────────────────────────

    async fn insert_steps(&self, tour_id: DbId, steps: &[NewStep]) -> DbResult<Vec<TourStep>>;

    async fn max_step_order(&self, tour_id: DbId) -> DbResult<Option<i32>>;

    /// Ordered by `step_order`, ties broken by id.
    async fn list_steps(&self, tour_id: DbId) -> DbResult<Vec<TourStep>>;

    async fn list_steps_for_tours(&self, tour_ids: &[DbId]) -> DbResult<Vec<TourStep>>;

    async fn count_steps(&self, tour_id: DbId) -> DbResult<i64>;

    async fn update_step(
        &self,
        step_id: DbId,
        tour_id: DbId,
        input: &UpdateStep,
    ) -> DbResult<Option<TourStep>>;

    async fn set_step_order(&self, step_id: DbId, tour_id: DbId, order: i32) -> DbResult<bool>;

    async fn set_completion_rate(
        &self,
        step_id: DbId,
        tour_id: DbId,
        rate: f64,
    ) -> DbResult<Option<TourStep>>;

    async fn delete_step(&self, step_id: DbId, tour_id: DbId) -> DbResult<bool>;

    // ── Analytics ────────────────────────────────────────────────────

    async fn insert_event(
        &self,
        tour_id: DbId,
        input: &CreateAnalyticsEvent,
    ) -> DbResult<AnalyticsEventRow>;

    async fn list_events(
        &self,
        tour_ids: &[DbId],
        event_types: &[&str],
        since: Option<Timestamp>,
    ) -> DbResult<Vec<AnalyticsEventRow>>;

    // ── Profiles ─────────────────────────────────────────────────────

    async fn upsert_profile(&self, input: &UpsertProfile) -> DbResult<Profile>;

    async fn count_profiles(&self) -> DbResult<i64>;
}
