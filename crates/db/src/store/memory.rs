//! In-process [`TourStore`] used by tests and local demos.
//!
//! Mirrors the Postgres schema's behaviour that the services rely on: ids
//! are sequential, tour deletes cascade to steps and events, and every
//! call takes the lock for exactly one operation (no cross-call isolation,
//! same as the real store). Individual operations can be made to fail with
//! [`MemoryTourStore::fail`] to exercise partial-failure paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tourflow_core::error::CoreError;
use tourflow_core::tour::TourStatus;
use tourflow_core::types::{DbId, OwnerId, Timestamp};

use crate::models::analytics::{AnalyticsEventRow, CreateAnalyticsEvent};
use crate::models::profile::{Profile, UpsertProfile};
use crate::models::step::{NewStep, TourStep, UpdateStep};
use crate::models::tour::{NewTour, RecentTour, StepCountDrift, Tour, TourTotals, UpdateTour};
use crate::store::TourStore;
use crate::{DbError, DbResult};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Ping,
    InsertTour,
    FindTour,
    ListTours,
    TourTotals,
    UpdateTour,
    SetTotalSteps,
    DeleteTour,
    InsertSteps,
    MaxStepOrder,
    ListSteps,
    UpdateStep,
    SetStepOrder,
    DeleteStep,
    InsertEvent,
    ListEvents,
    Profiles,
}

#[derive(Debug, Default)]
struct State {
    last_tour_id: DbId,
    last_step_id: DbId,
    last_event_id: DbId,
    tours: BTreeMap<DbId, Tour>,
    steps: BTreeMap<DbId, TourStep>,
    events: Vec<AnalyticsEventRow>,
    profiles: BTreeMap<OwnerId, Profile>,
}

impl State {
    fn steps_of(&self, tour_id: DbId) -> Vec<TourStep> {
        let mut steps: Vec<TourStep> = self
            .steps
            .values()
            .filter(|s| s.tour_id == tour_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| (s.step_order, s.id));
        steps
    }

    fn owned_tour_mut(&mut self, tour_id: DbId, owner: OwnerId) -> Option<&mut Tour> {
        self.tours
            .get_mut(&tour_id)
            .filter(|t| t.user_id == owner)
    }

    fn step_in_tour_mut(&mut self, step_id: DbId, tour_id: DbId) -> Option<&mut TourStep> {
        self.steps
            .get_mut(&step_id)
            .filter(|s| s.tour_id == tour_id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryTourStore {
    state: RwLock<State>,
    failing: Mutex<HashSet<StoreOp>>,
}

impl MemoryTourStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `op` fail with [`DbError::Unavailable`] until healed.
    pub fn fail(&self, op: StoreOp) {
        self.failing_ops().insert(op);
    }

    pub fn heal(&self, op: StoreOp) {
        self.failing_ops().remove(&op);
    }

    /// Insert an event with an explicit timestamp.
    pub async fn seed_event(
        &self,
        tour_id: DbId,
        session_id: &str,
        event_type: &str,
        metadata: serde_json::Value,
        occurred_at: Timestamp,
    ) -> AnalyticsEventRow {
        let mut state = self.state.write().await;
        state.last_event_id += 1;
        let row = AnalyticsEventRow {
            id: state.last_event_id,
            tour_id,
            session_id: session_id.to_string(),
            event_type: event_type.to_string(),
            metadata,
            occurred_at,
        };
        state.events.push(row.clone());
        row
    }

    /// Overwrite a tour's cached count without touching `updated_at`, to
    /// simulate drift left by an earlier partial failure.
    pub async fn force_total_steps(&self, tour_id: DbId, total: i32) {
        if let Some(tour) = self.state.write().await.tours.get_mut(&tour_id) {
            tour.total_steps = total;
        }
    }

    /// Number of steps for `tour_id` regardless of ownership.
    pub async fn raw_step_count(&self, tour_id: DbId) -> usize {
        self.state.read().await.steps_of(tour_id).len()
    }

    fn failing_ops(&self) -> std::sync::MutexGuard<'_, HashSet<StoreOp>> {
        // A poisoned set only means a test panicked mid-update; keep using it.
        self.failing.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self, op: StoreOp) -> DbResult<()> {
        if self.failing_ops().contains(&op) {
            return Err(DbError::Unavailable(format!("injected failure for {op:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl TourStore for MemoryTourStore {
    async fn ping(&self) -> DbResult<()> {
        self.check(StoreOp::Ping)
    }

    async fn insert_tour(&self, owner: OwnerId, tour: &NewTour) -> DbResult<Tour> {
        self.check(StoreOp::InsertTour)?;
        let mut state = self.state.write().await;
        state.last_tour_id += 1;
        let now = Utc::now();
        let row = Tour {
            id: state.last_tour_id,
            user_id: owner,
            title: tour.title.clone(),
            description: tour.description.clone(),
            status: tour.status,
            total_steps: tour.total_steps,
            created_at: now,
            updated_at: now,
        };
        state.tours.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_tour(&self, tour_id: DbId) -> DbResult<Option<Tour>> {
        self.check(StoreOp::FindTour)?;
        Ok(self.state.read().await.tours.get(&tour_id).cloned())
    }

    async fn find_owned_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<Option<Tour>> {
        self.check(StoreOp::FindTour)?;
        let state = self.state.read().await;
        Ok(state
            .tours
            .get(&tour_id)
            .filter(|t| t.user_id == owner)
            .cloned())
    }

    async fn list_tours(&self, owner: OwnerId) -> DbResult<Vec<Tour>> {
        self.check(StoreOp::ListTours)?;
        let state = self.state.read().await;
        // Ids are sequential, so id order breaks created_at ties.
        let mut tours: Vec<Tour> = state
            .tours
            .values()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect();
        tours.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tours)
    }

    async fn list_recent_tours(&self, owner: OwnerId, limit: i64) -> DbResult<Vec<RecentTour>> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let tours = self.list_tours(owner).await?;
        Ok(tours.iter().take(limit).map(RecentTour::from).collect())
    }

    async fn tour_totals(&self, owner: OwnerId) -> DbResult<TourTotals> {
        self.check(StoreOp::TourTotals)?;
        let state = self.state.read().await;
        let mut totals = TourTotals::default();
        for tour in state.tours.values().filter(|t| t.user_id == owner) {
            totals.total_tours += 1;
            if tour.status == TourStatus::Active {
                totals.active_tours += 1;
            }
            totals.total_steps += i64::from(tour.total_steps);
        }
        Ok(totals)
    }

    async fn update_tour(
        &self,
        tour_id: DbId,
        owner: OwnerId,
        input: &UpdateTour,
    ) -> DbResult<Option<Tour>> {
        self.check(StoreOp::UpdateTour)?;
        let mut state = self.state.write().await;
        let Some(tour) = state.owned_tour_mut(tour_id, owner) else {
            return Ok(None);
        };
        if let Some(title) = &input.title {
            tour.title = title.clone();
        }
        if let Some(description) = &input.description {
            tour.description = description.clone();
        }
        if let Some(status) = input.status {
            tour.status = status;
        }
        tour.updated_at = Utc::now();
        Ok(Some(tour.clone()))
    }

    async fn set_total_steps(&self, tour_id: DbId, total: i32) -> DbResult<bool> {
        self.check(StoreOp::SetTotalSteps)?;
        let mut state = self.state.write().await;
        let Some(tour) = state.tours.get_mut(&tour_id) else {
            return Ok(false);
        };
        tour.total_steps = total.max(0);
        tour.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<bool> {
        self.check(StoreOp::DeleteTour)?;
        let mut state = self.state.write().await;
        if state.owned_tour_mut(tour_id, owner).is_none() {
            return Ok(false);
        }
        state.tours.remove(&tour_id);
        state.steps.retain(|_, s| s.tour_id != tour_id);
        state.events.retain(|e| e.tour_id != tour_id);
        Ok(true)
    }

    async fn find_step_count_drift(&self) -> DbResult<Vec<StepCountDrift>> {
        self.check(StoreOp::ListTours)?;
        let state = self.state.read().await;
        Ok(state
            .tours
            .values()
            .filter_map(|tour| {
                let actual = state.steps.values().filter(|s| s.tour_id == tour.id).count() as i64;
                (i64::from(tour.total_steps) != actual).then_some(StepCountDrift {
                    tour_id: tour.id,
                    cached: tour.total_steps,
                    actual,
                })
            })
            .collect())
    }

    async fn insert_steps(&self, tour_id: DbId, steps: &[NewStep]) -> DbResult<Vec<TourStep>> {
        self.check(StoreOp::InsertSteps)?;
        let mut state = self.state.write().await;
        if !state.tours.contains_key(&tour_id) {
            return Err(CoreError::NotFound {
                entity: "Tour",
                id: tour_id,
            }
            .into());
        }
        let now = Utc::now();
        let mut created = Vec::with_capacity(steps.len());
        for step in steps {
            state.last_step_id += 1;
            let row = TourStep {
                id: state.last_step_id,
                tour_id,
                step_order: step.step_order,
                title: step.title.clone(),
                description: step.description.clone(),
                completion_rate: 0.0,
                created_at: now,
                updated_at: now,
            };
            state.steps.insert(row.id, row.clone());
            created.push(row);
        }
        created.sort_by_key(|s| (s.step_order, s.id));
        Ok(created)
    }

    async fn max_step_order(&self, tour_id: DbId) -> DbResult<Option<i32>> {
        self.check(StoreOp::MaxStepOrder)?;
        let state = self.state.read().await;
        Ok(state
            .steps
            .values()
            .filter(|s| s.tour_id == tour_id)
            .map(|s| s.step_order)
            .max())
    }

    async fn list_steps(&self, tour_id: DbId) -> DbResult<Vec<TourStep>> {
        self.check(StoreOp::ListSteps)?;
        Ok(self.state.read().await.steps_of(tour_id))
    }

    async fn list_steps_for_tours(&self, tour_ids: &[DbId]) -> DbResult<Vec<TourStep>> {
        self.check(StoreOp::ListSteps)?;
        let state = self.state.read().await;
        let mut steps: Vec<TourStep> = state
            .steps
            .values()
            .filter(|s| tour_ids.contains(&s.tour_id))
            .cloned()
            .collect();
        steps.sort_by_key(|s| (s.tour_id, s.step_order, s.id));
        Ok(steps)
    }

    async fn count_steps(&self, tour_id: DbId) -> DbResult<i64> {
        self.check(StoreOp::ListSteps)?;
        Ok(self.state.read().await.steps_of(tour_id).len() as i64)
    }

    async fn update_step(
        &self,
        step_id: DbId,
        tour_id: DbId,
        input: &UpdateStep,
    ) -> DbResult<Option<TourStep>> {
        self.check(StoreOp::UpdateStep)?;
        let mut state = self.state.write().await;
        let Some(step) = state.step_in_tour_mut(step_id, tour_id) else {
            return Ok(None);
        };
        if let Some(title) = &input.title {
            step.title = title.clone();
        }
        if let Some(description) = &input.description {
            step.description = description.clone();
        }
        step.updated_at = Utc::now();
        Ok(Some(step.clone()))
    }

    async fn set_step_order(&self, step_id: DbId, tour_id: DbId, order: i32) -> DbResult<bool> {
        self.check(StoreOp::SetStepOrder)?;
        let mut state = self.state.write().await;
        let Some(step) = state.step_in_tour_mut(step_id, tour_id) else {
            return Ok(false);
        };
        step.step_order = order;
        step.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_completion_rate(
        &self,
        step_id: DbId,
        tour_id: DbId,
        rate: f64,
    ) -> DbResult<Option<TourStep>> {
        self.check(StoreOp::UpdateStep)?;
        let mut state = self.state.write().await;
        let Some(step) = state.step_in_tour_mut(step_id, tour_id) else {
            return Ok(None);
        };
        step.completion_rate = rate;
        step.updated_at = Utc::now();
        Ok(Some(step.clone()))
    }

    async fn delete_step(&self, step_id: DbId, tour_id: DbId) -> DbResult<bool> {
        self.check(StoreOp::DeleteStep)?;
        let mut state = self.state.write().await;
        if state.step_in_tour_mut(step_id, tour_id).is_none() {
            return Ok(false);
        }
        state.steps.remove(&step_id);
        Ok(true)
    }

    async fn insert_event(
        &self,
        tour_id: DbId,
        input: &CreateAnalyticsEvent,
    ) -> DbResult<AnalyticsEventRow> {
        self.check(StoreOp::InsertEvent)?;
        if !self.state.read().await.tours.contains_key(&tour_id) {
            return Err(CoreError::NotFound {
                entity: "Tour",
                id: tour_id,
            }
            .into());
        }
        Ok(self
            .seed_event(
                tour_id,
                &input.session_id,
                &input.event_type,
                input.metadata.clone(),
                Utc::now(),
            )
            .await)
    }

    async fn list_events(
        &self,
        tour_ids: &[DbId],
        event_types: &[&str],
        since: Option<Timestamp>,
    ) -> DbResult<Vec<AnalyticsEventRow>> {
        self.check(StoreOp::ListEvents)?;
        let state = self.state.read().await;
        let mut events: Vec<AnalyticsEventRow> = state
            .events
            .iter()
            .filter(|e| tour_ids.contains(&e.tour_id))
            .filter(|e| event_types.contains(&e.event_type.as_str()))
            .filter(|e| since.map_or(true, |t| e.occurred_at >= t))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.occurred_at, e.id));
        Ok(events)
    }

    async fn upsert_profile(&self, input: &UpsertProfile) -> DbResult<Profile> {
        self.check(StoreOp::Profiles)?;
        let mut state = self.state.write().await;
        let now = Utc::now();
        let profile = state.profiles.entry(input.id).or_insert_with(|| Profile {
            id: input.id,
            email: None,
            display_name: None,
            created_at: now,
            updated_at: now,
        });
        profile.email = input.email.clone();
        profile.display_name = input.display_name.clone();
        profile.updated_at = now;
        Ok(profile.clone())
    }

    async fn count_profiles(&self) -> DbResult<i64> {
        self.check(StoreOp::Profiles)?;
        Ok(self.state.read().await.profiles.len() as i64)
    }
}
