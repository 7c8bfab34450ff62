//! Widget analytics event rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tourflow_core::analytics::{EventKind, TourEvent};
use tourflow_core::error::CoreError;
use tourflow_core::types::{DbId, Timestamp};

/// A row from the `tour_analytics` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AnalyticsEventRow {
    pub id: DbId,
    pub tour_id: DbId,
    pub session_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub event_type: String,
    pub metadata: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl AnalyticsEventRow {
    /// Parse the loosely typed row into a [`TourEvent`].
    pub fn to_event(&self) -> Result<TourEvent, CoreError> {
        Ok(TourEvent {
            tour_id: self.tour_id,
            session_id: self.session_id.clone(),
            kind: EventKind::parse(&self.event_type, &self.metadata)?,
            occurred_at: self.occurred_at,
        })
    }
}

/// DTO posted by the widget.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAnalyticsEvent {
    pub session_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default = "empty_metadata")]
    pub metadata: serde_json::Value,
}

fn empty_metadata() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
