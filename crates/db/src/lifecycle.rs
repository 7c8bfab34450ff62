//! Tour and step mutations.
//!
//! [`TourLifecycle`] owns every write that touches step ordering or the
//! cached `total_steps` counter. After each successful call a tour's steps
//! sit at `step_order` `1..=N`; the counter matches `N` unless a counter
//! update failed, in which case the drift is logged and left for
//! [`TourLifecycle::reconcile`] / [`TourLifecycle::reconcile_all`].
//!
//! The store offers no multi-statement transactions. Sequences that must
//! not leave half-written state register compensating actions on a
//! [`UnitOfWork`] and roll back explicitly.

use std::collections::HashMap;
use std::sync::Arc;

use tourflow_core::error::CoreError;
use tourflow_core::ordering::{self, OrderAssignment};
use tourflow_core::tour::{
    validate_completion_rate, validate_step_description, validate_step_fields,
    validate_step_title, validate_tour_description, validate_tour_title, TourStatus,
};
use tourflow_core::types::{DbId, OwnerId};

use crate::models::step::{CreateStep, NewStep, TourStep, UpdateStep};
use crate::models::tour::{
    CreateTour, NewTour, StepCountDrift, StepCounts, Tour, TourWithSteps, UpdateTour,
};
use crate::store::TourStore;
use crate::{DbError, DbResult};

// ---------------------------------------------------------------------------
// Unit of work
// ---------------------------------------------------------------------------

/// An undo action registered after a write succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compensation {
    DeleteTour { tour_id: DbId, owner: OwnerId },
}

/// Collects compensations for a multi-call write and either discards them
/// ([`commit`](Self::commit)) or runs them newest first
/// ([`rollback`](Self::rollback)).
pub struct UnitOfWork<'a> {
    store: &'a dyn TourStore,
    label: &'static str,
    compensations: Vec<Compensation>,
}

impl<'a> UnitOfWork<'a> {
    pub fn begin(store: &'a dyn TourStore, label: &'static str) -> Self {
        Self {
            store,
            label,
            compensations: Vec::new(),
        }
    }

    pub fn on_rollback(&mut self, compensation: Compensation) {
        self.compensations.push(compensation);
    }

    pub fn commit(mut self) {
        tracing::debug!(unit = self.label, "Unit of work committed");
        self.compensations.clear();
    }

    /// Run compensations newest first. Failures are logged and do not stop
    /// the remaining compensations.
    pub async fn rollback(mut self) {
        let compensations = std::mem::take(&mut self.compensations);
        for compensation in compensations.into_iter().rev() {
            let result = match compensation {
                Compensation::DeleteTour { tour_id, owner } => {
                    self.store.delete_tour(tour_id, owner).await.map(|_| ())
                }
            };
            match result {
                Ok(()) => {
                    tracing::info!(unit = self.label, ?compensation, "Rolled back");
                }
                Err(e) => {
                    tracing::error!(
                        unit = self.label,
                        ?compensation,
                        error = %e,
                        "Rollback step failed",
                    );
                }
            }
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.compensations.is_empty() {
            tracing::warn!(
                unit = self.label,
                pending = self.compensations.len(),
                "Unit of work dropped without commit or rollback",
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle service
// ---------------------------------------------------------------------------

/// Tenant-scoped tour and step mutations over an injected [`TourStore`].
#[derive(Clone)]
pub struct TourLifecycle {
    store: Arc<dyn TourStore>,
}

fn not_owned(tour_id: DbId) -> DbError {
    CoreError::NotOwned {
        entity: "Tour",
        id: tour_id,
    }
    .into()
}

fn step_not_found(step_id: DbId) -> DbError {
    CoreError::NotFound {
        entity: "TourStep",
        id: step_id,
    }
    .into()
}

fn to_count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

impl TourLifecycle {
    pub fn new(store: Arc<dyn TourStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TourStore> {
        &self.store
    }

    /// Load a tour, failing with `NotOwned` unless `owner` owns it.
    async fn owned_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<Tour> {
        self.store
            .find_owned_tour(tour_id, owner)
            .await?
            .ok_or_else(|| not_owned(tour_id))
    }

    // ── Tours ────────────────────────────────────────────────────────

    /// The tour row alone, owner-scoped.
    pub async fn find_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<Tour> {
        self.owned_tour(tour_id, owner).await
    }

    /// Create a tour and its initial steps (orders `1..=N` in input order).
    ///
    /// If the steps cannot be written the tour row is deleted again, so no
    /// tour is left with a `total_steps` that has no rows behind it.
    pub async fn create_tour(&self, owner: OwnerId, input: &CreateTour) -> DbResult<Tour> {
        validate_tour_title(&input.title)?;
        validate_tour_description(&input.description)?;
        for (i, step) in input.steps.iter().enumerate() {
            validate_step_fields(&step.title, &step.description, Some(i + 1))?;
        }

        let new_tour = NewTour {
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            status: input.status.unwrap_or_default(),
            total_steps: to_count(input.steps.len()),
        };

        let mut uow = UnitOfWork::begin(self.store.as_ref(), "create_tour");
        let tour = self.store.insert_tour(owner, &new_tour).await?;
        uow.on_rollback(Compensation::DeleteTour {
            tour_id: tour.id,
            owner,
        });

        let steps: Vec<NewStep> = input
            .steps
            .iter()
            .zip(ordering::initial_orders(input.steps.len()))
            .map(|(step, step_order)| NewStep {
                step_order,
                title: step.title.trim().to_string(),
                description: step.description.trim().to_string(),
            })
            .collect();

        if !steps.is_empty() {
            if let Err(e) = self.store.insert_steps(tour.id, &steps).await {
                tracing::error!(tour_id = tour.id, error = %e, "Step insert failed, removing tour");
                uow.rollback().await;
                return Err(e);
            }
        }

        uow.commit();
        tracing::info!(tour_id = tour.id, %owner, steps = steps.len(), "Tour created");
        Ok(tour)
    }

    /// A tour with its ordered steps.
    ///
    /// If the cached `total_steps` disagrees with the rows, the returned
    /// value carries the real count; the stored counter is left for
    /// reconciliation.
    pub async fn get_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<TourWithSteps> {
        let mut tour = self.owned_tour(tour_id, owner).await?;
        let tour_steps = self.store.list_steps(tour_id).await?;

        let actual = to_count(tour_steps.len());
        if tour.total_steps != actual {
            tracing::warn!(
                tour_id,
                cached = tour.total_steps,
                actual,
                "total_steps drifted; serving recomputed count",
            );
            tour.total_steps = actual;
        }

        Ok(TourWithSteps { tour, tour_steps })
    }

    /// An owner's tours, newest first.
    pub async fn list_tours(&self, owner: OwnerId) -> DbResult<Vec<Tour>> {
        self.store.list_tours(owner).await
    }

    /// An owner's tours with their steps, newest first.
    pub async fn list_tours_with_steps(&self, owner: OwnerId) -> DbResult<Vec<TourWithSteps>> {
        let tours = self.store.list_tours(owner).await?;
        let ids: Vec<DbId> = tours.iter().map(|t| t.id).collect();
        let mut by_tour: HashMap<DbId, Vec<TourStep>> = HashMap::new();
        for step in self.store.list_steps_for_tours(&ids).await? {
            by_tour.entry(step.tour_id).or_default().push(step);
        }

        Ok(tours
            .into_iter()
            .map(|tour| {
                let tour_steps = by_tour.remove(&tour.id).unwrap_or_default();
                TourWithSteps { tour, tour_steps }
            })
            .collect())
    }

    /// Update title, description or status. Ordering is unaffected.
    pub async fn update_tour(
        &self,
        tour_id: DbId,
        owner: OwnerId,
        input: &UpdateTour,
    ) -> DbResult<Tour> {
        if let Some(title) = &input.title {
            validate_tour_title(title)?;
        }
        if let Some(description) = &input.description {
            validate_tour_description(description)?;
        }
        let input = UpdateTour {
            title: input.title.as_deref().map(|s| s.trim().to_string()),
            description: input.description.as_deref().map(|s| s.trim().to_string()),
            status: input.status,
        };

        self.store
            .update_tour(tour_id, owner, &input)
            .await?
            .ok_or_else(|| not_owned(tour_id))
    }

    pub async fn set_status(
        &self,
        tour_id: DbId,
        owner: OwnerId,
        status: TourStatus,
    ) -> DbResult<Tour> {
        let update = UpdateTour {
            status: Some(status),
            ..UpdateTour::default()
        };
        let tour = self
            .store
            .update_tour(tour_id, owner, &update)
            .await?
            .ok_or_else(|| not_owned(tour_id))?;
        tracing::info!(tour_id, %status, "Tour status set");
        Ok(tour)
    }

    /// Flip between active and inactive.
    pub async fn toggle_status(&self, tour_id: DbId, owner: OwnerId) -> DbResult<Tour> {
        let tour = self.owned_tour(tour_id, owner).await?;
        self.set_status(tour_id, owner, tour.status.toggled()).await
    }

    /// Delete a tour; its steps and events cascade.
    pub async fn delete_tour(&self, tour_id: DbId, owner: OwnerId) -> DbResult<()> {
        if !self.store.delete_tour(tour_id, owner).await? {
            return Err(not_owned(tour_id));
        }
        tracing::info!(tour_id, %owner, "Tour deleted");
        Ok(())
    }

    // ── Steps ────────────────────────────────────────────────────────

    pub async fn list_steps(&self, tour_id: DbId, owner: OwnerId) -> DbResult<Vec<TourStep>> {
        self.owned_tour(tour_id, owner).await?;
        self.store.list_steps(tour_id).await
    }

    /// Append a step at `max(step_order) + 1` and bump the counter.
    ///
    /// A failed counter update after a successful insert is logged and not
    /// returned: the step exists and the drift is repairable.
    pub async fn add_step(
        &self,
        tour_id: DbId,
        owner: OwnerId,
        input: &CreateStep,
    ) -> DbResult<TourStep> {
        validate_step_fields(&input.title, &input.description, None)?;
        let tour = self.owned_tour(tour_id, owner).await?;

        let max = self.store.max_step_order(tour_id).await?;
        let new_step = NewStep {
            step_order: ordering::next_step_order(max),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
        };
        let step = self
            .store
            .insert_steps(tour_id, std::slice::from_ref(&new_step))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Internal("Step insert returned no row".to_string()))?;

        if let Err(e) = self
            .store
            .set_total_steps(tour_id, tour.total_steps.saturating_add(1))
            .await
        {
            tracing::warn!(tour_id, step_id = step.id, error = %e, "Step added but total_steps not updated");
        }

        tracing::info!(tour_id, step_id = step.id, step_order = step.step_order, "Step added");
        Ok(step)
    }

    /// Edit a step's title and/or description.
    pub async fn update_step(
        &self,
        step_id: DbId,
        tour_id: DbId,
        owner: OwnerId,
        input: &UpdateStep,
    ) -> DbResult<TourStep> {
        if let Some(title) = &input.title {
            validate_step_title(title)?;
        }
        if let Some(description) = &input.description {
            validate_step_description(description)?;
        }
        self.owned_tour(tour_id, owner).await?;

        let input = UpdateStep {
            title: input.title.as_deref().map(|s| s.trim().to_string()),
            description: input.description.as_deref().map(|s| s.trim().to_string()),
        };
        self.store
            .update_step(step_id, tour_id, &input)
            .await?
            .ok_or_else(|| step_not_found(step_id))
    }

    /// Delete a step and close the gap it leaves.
    ///
    /// Postcondition: remaining steps sit at `1..=M` in their previous
    /// relative order. The renumbering is read-then-write and is not
    /// isolated from concurrent mutations of the same tour.
    pub async fn delete_step(&self, step_id: DbId, tour_id: DbId, owner: OwnerId) -> DbResult<()> {
        let tour = self.owned_tour(tour_id, owner).await?;

        if !self.store.delete_step(step_id, tour_id).await? {
            return Err(step_not_found(step_id));
        }

        let total = (tour.total_steps - 1).max(0);
        if let Err(e) = self.store.set_total_steps(tour_id, total).await {
            tracing::warn!(tour_id, step_id, error = %e, "Step deleted but total_steps not updated");
        }

        let remaining = self.store.list_steps(tour_id).await?;
        let current: Vec<(DbId, i32)> = remaining.iter().map(|s| (s.id, s.step_order)).collect();
        let plan = ordering::renumber(&current);
        self.apply_orders(tour_id, &plan).await?;

        tracing::info!(tour_id, step_id, renumbered = plan.len(), "Step deleted");
        Ok(())
    }

    /// Reorder steps to match `step_ids`.
    ///
    /// `step_ids` must contain every step of the tour exactly once;
    /// anything else is rejected before any write.
    pub async fn reorder_steps(
        &self,
        tour_id: DbId,
        owner: OwnerId,
        step_ids: &[DbId],
    ) -> DbResult<Vec<TourStep>> {
        self.owned_tour(tour_id, owner).await?;

        let current: Vec<DbId> = self
            .store
            .list_steps(tour_id)
            .await?
            .iter()
            .map(|s| s.id)
            .collect();
        ordering::validate_permutation(&current, step_ids)?;

        self.apply_orders(tour_id, &ordering::reorder(step_ids)).await?;
        tracing::info!(tour_id, steps = step_ids.len(), "Steps reordered");
        self.store.list_steps(tour_id).await
    }

    /// Assign `i + 1` to each listed step without checking that the list
    /// covers the tour. Ids outside the tour are skipped; omitted steps keep
    /// their old order, which can leave duplicates or gaps.
    pub async fn reorder_steps_unchecked(
        &self,
        tour_id: DbId,
        owner: OwnerId,
        step_ids: &[DbId],
    ) -> DbResult<Vec<TourStep>> {
        self.owned_tour(tour_id, owner).await?;
        self.apply_orders(tour_id, &ordering::reorder(step_ids)).await?;
        self.store.list_steps(tour_id).await
    }

    async fn apply_orders(&self, tour_id: DbId, plan: &[OrderAssignment]) -> DbResult<()> {
        for assignment in plan {
            let updated = self
                .store
                .set_step_order(assignment.step_id, tour_id, assignment.order)
                .await?;
            if !updated {
                tracing::debug!(tour_id, step_id = assignment.step_id, "Order target not in tour");
            }
        }
        Ok(())
    }

    pub async fn set_completion_rate(
        &self,
        step_id: DbId,
        tour_id: DbId,
        owner: OwnerId,
        rate: f64,
    ) -> DbResult<TourStep> {
        validate_completion_rate(rate)?;
        self.owned_tour(tour_id, owner).await?;
        self.store
            .set_completion_rate(step_id, tour_id, rate)
            .await?
            .ok_or_else(|| step_not_found(step_id))
    }

    // ── Counter reconciliation ───────────────────────────────────────

    /// The cached counter next to the real row count.
    pub async fn step_counts(&self, tour_id: DbId, owner: OwnerId) -> DbResult<StepCounts> {
        let tour = self.owned_tour(tour_id, owner).await?;
        let actual = self.store.count_steps(tour_id).await?;
        Ok(StepCounts {
            cached: tour.total_steps,
            actual,
        })
    }

    /// Rewrite one tour's counter from its rows; returns the counts after.
    pub async fn reconcile(&self, tour_id: DbId, owner: OwnerId) -> DbResult<StepCounts> {
        let before = self.step_counts(tour_id, owner).await?;
        if before.is_consistent() {
            return Ok(before);
        }

        let actual = i32::try_from(before.actual).unwrap_or(i32::MAX);
        self.store.set_total_steps(tour_id, actual).await?;
        tracing::info!(tour_id, cached = before.cached, actual, "Reconciled total_steps");
        Ok(StepCounts {
            cached: actual,
            actual: before.actual,
        })
    }

    /// Repair every drifted counter in the store. Returns what was repaired.
    pub async fn reconcile_all(&self) -> DbResult<Vec<StepCountDrift>> {
        let drifted = self.store.find_step_count_drift().await?;
        let mut repaired = Vec::with_capacity(drifted.len());
        for drift in drifted {
            let actual = i32::try_from(drift.actual).unwrap_or(i32::MAX);
            match self.store.set_total_steps(drift.tour_id, actual).await {
                Ok(_) => repaired.push(drift),
                Err(e) => {
                    tracing::error!(tour_id = drift.tour_id, error = %e, "Failed to reconcile total_steps");
                }
            }
        }
        Ok(repaired)
    }
}
