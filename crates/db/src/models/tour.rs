//! Tour entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tourflow_core::tour::TourStatus;
use tourflow_core::types::{DbId, OwnerId, Timestamp};

use crate::models::step::{CreateStep, TourStep};

/// A row from the `tours` table.
///
/// `total_steps` caches the number of `tour_steps` rows and may drift after
/// a partial failure; see `TourLifecycle::reconcile`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Tour {
    pub id: DbId,
    pub user_id: OwnerId,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub status: TourStatus,
    pub total_steps: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A tour together with its steps in `step_order`.
#[derive(Debug, Clone, Serialize)]
pub struct TourWithSteps {
    #[serde(flatten)]
    pub tour: Tour,
    pub tour_steps: Vec<TourStep>,
}

/// DTO for creating a tour, optionally with its initial steps.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTour {
    pub title: String,
    pub description: String,
    pub status: Option<TourStatus>,
    #[serde(default)]
    pub steps: Vec<CreateStep>,
}

/// DTO for updating tour metadata. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTour {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TourStatus>,
}

/// Column values for a `tours` insert.
#[derive(Debug, Clone)]
pub struct NewTour {
    pub title: String,
    pub description: String,
    pub status: TourStatus,
    pub total_steps: i32,
}

/// Projection used by the dashboard's recent tours list.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct RecentTour {
    pub id: DbId,
    pub title: String,
    pub total_steps: i32,
    #[sqlx(try_from = "String")]
    pub status: TourStatus,
}

impl From<&Tour> for RecentTour {
    fn from(tour: &Tour) -> Self {
        Self {
            id: tour.id,
            title: tour.title.clone(),
            total_steps: tour.total_steps,
            status: tour.status,
        }
    }
}

/// A tour whose cached `total_steps` disagrees with its step rows.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct StepCountDrift {
    pub tour_id: DbId,
    pub cached: i32,
    pub actual: i64,
}

/// Cached and recomputed step counts for one tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepCounts {
    pub cached: i32,
    pub actual: i64,
}

impl StepCounts {
    pub fn is_consistent(&self) -> bool {
        i64::from(self.cached) == self.actual
    }
}

/// Per-owner tour totals for the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRow, Serialize)]
pub struct TourTotals {
    pub total_tours: i64,
    pub active_tours: i64,
    pub total_steps: i64,
}

/// Payload the embeddable widget renders.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetTour {
    pub tour_id: DbId,
    pub title: String,
    pub steps: Vec<crate::models::step::WidgetStep>,
}
