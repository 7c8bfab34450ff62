//! [`TourStore`] backed by the Postgres repositories.

use async_trait::async_trait;
use tourflow_core::types::{DbId, OwnerId, Timestamp};

use crate::models::analytics::{AnalyticsEventRow, CreateAnalyticsEvent};
use crate::models::profile::{Profile, UpsertProfile};
use crate::models::step::{NewStep, TourStep, UpdateStep};
use crate::models::tour::{NewTour, RecentTour, StepCountDrift, Tour, TourTotals, UpdateTour};
use crate::repositories::{AnalyticsRepo, ProfileRepo, TourRepo, TourStepRepo};
use crate::store::TourStore;
use crate::{DbPool, DbResult};

#[derive(Clone)]
pub struct PgTourStore {
    pool: DbPool,
}

impl PgTourStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl TourStore for PgTourStore {
    async fn ping(&self) -> DbResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn insert_tour(&self, owner: OwnerId, tour: &NewTour) -> DbResult<Tour> {
        Ok(TourRepo::create(&self.pool, owner, tour).await?)
    }

    async fn find_tour(&self, tour_id: DbId) -> DbResult<Option<Tour>> {
        Ok(TourRepo::find_by_id(&self.pool, tour_id).await?)
    }

    async fn find_owned_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<Option<Tour>> {
        Ok(TourRepo::find_owned(&self.pool, tour_id, owner).await?)
    }

    async fn list_tours(&self, owner: OwnerId) -> DbResult<Vec<Tour>> {
        Ok(TourRepo::list_by_owner(&self.pool, owner).await?)
    }

    async fn list_recent_tours(&self, owner: OwnerId, limit: i64) -> DbResult<Vec<RecentTour>> {
        Ok(TourRepo::list_recent(&self.pool, owner, limit).await?)
    }

    async fn tour_totals(&self, owner: OwnerId) -> DbResult<TourTotals> {
        Ok(TourRepo::totals(&self.pool, owner).await?)
    }

    async fn update_tour(
        &self,
        tour_id: DbId,
        owner: OwnerId,
        input: &UpdateTour,
    ) -> DbResult<Option<Tour>> {
        Ok(TourRepo::update(&self.pool, tour_id, owner, input).await?)
    }

    async fn set_total_steps(&self, tour_id: DbId, total: i32) -> DbResult<bool> {
        Ok(TourRepo::set_total_steps(&self.pool, tour_id, total).await?)
    }

    async fn delete_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<bool> {
        Ok(TourRepo::delete(&self.pool, tour_id, owner).await?)
    }

    async fn find_step_count_drift(&self) -> DbResult<Vec<StepCountDrift>> {
        Ok(TourRepo::find_step_count_drift(&self.pool).await?)
    }

    async fn insert_steps(&self, tour_id: DbId, steps: &[NewStep]) -> DbResult<Vec<TourStep>> {
        Ok(TourStepRepo::create_many(&self.pool, tour_id, steps).await?)
    }

    async fn max_step_order(&self, tour_id: DbId) -> DbResult<Option<i32>> {
        Ok(TourStepRepo::max_order(&self.pool, tour_id).await?)
    }

    async fn list_steps(&self, tour_id: DbId) -> DbResult<Vec<TourStep>> {
        Ok(TourStepRepo::list_by_tour(&self.pool, tour_id).await?)
    }

    async fn list_steps_for_tours(&self, tour_ids: &[DbId]) -> DbResult<Vec<TourStep>> {
        Ok(TourStepRepo::list_by_tours(&self.pool, tour_ids).await?)
    }

    async fn count_steps(&self, tour_id: DbId) -> DbResult<i64> {
        Ok(TourStepRepo::count_by_tour(&self.pool, tour_id).await?)
    }

    async fn update_step(
        &self,
        step_id: DbId,
        tour_id: DbId,
        input: &UpdateStep,
    ) -> DbResult<Option<TourStep>> {
        Ok(TourStepRepo::update(&self.pool, step_id, tour_id, input).await?)
    }

    async fn set_step_order(&self, step_id: DbId, tour_id: DbId, order: i32) -> DbResult<bool> {
        Ok(TourStepRepo::set_order(&self.pool, step_id, tour_id, order).await?)
    }

    async fn set_completion_rate(
        &self,
        step_id: DbId,
        tour_id: DbId,
        rate: f64,
    ) -> DbResult<Option<TourStep>> {
        Ok(TourStepRepo::set_completion_rate(&self.pool, step_id, tour_id, rate).await?)
    }

    async fn delete_step(&self, step_id: DbId, tour_id: DbId) -> DbResult<bool> {
        Ok(TourStepRepo::delete(&self.pool, step_id, tour_id).await?)
    }

    async fn insert_event(
        &self,
        tour_id: DbId,
        input: &CreateAnalyticsEvent,
    ) -> DbResult<AnalyticsEventRow> {
        Ok(AnalyticsRepo::create(&self.pool, tour_id, input).await?)
    }

    async fn list_events(
        &self,
        tour_ids: &[DbId],
        event_types: &[&str],
        since: Option<Timestamp>,
    ) -> DbResult<Vec<AnalyticsEventRow>> {
        Ok(AnalyticsRepo::list(&self.pool, tour_ids, event_types, since).await?)
    }

    async fn upsert_profile(&self, input: &UpsertProfile) -> DbResult<Profile> {
        Ok(ProfileRepo::upsert(&self.pool, input).await?)
    }

    async fn count_profiles(&self) -> DbResult<i64> {
        Ok(ProfileRepo::count(&self.pool).await?)
    }
}
