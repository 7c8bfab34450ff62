//! Tour step entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tourflow_core::types::{DbId, Timestamp};

/// A row from the `tour_steps` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct TourStep {
    pub id: DbId,
    pub tour_id: DbId,
    pub step_order: i32,
    pub title: String,
    pub description: String,
    pub completion_rate: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for adding a step. Its position is always assigned by the lifecycle.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStep {
    pub title: String,
    pub description: String,
}

/// DTO for editing a step's text. Ordering is changed only through reorder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStep {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Column values for a `tour_steps` insert.
#[derive(Debug, Clone)]
pub struct NewStep {
    pub step_order: i32,
    pub title: String,
    pub description: String,
}

/// Step shape handed to the embeddable widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetStep {
    pub id: DbId,
    pub title: String,
    pub content: String,
    pub order: i32,
}

impl From<TourStep> for WidgetStep {
    fn from(step: TourStep) -> Self {
        Self {
            id: step.id,
            title: step.title,
            content: step.description,
            order: step.step_order,
        }
    }
}
