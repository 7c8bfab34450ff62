//! Public reads and event ingest for the embeddable widget.
//!
//! Nothing here is owner-scoped: the widget runs on the tenant's site and
//! only knows the tour id. Inactive tours are indistinguishable from missing
//! ones.

use std::sync::Arc;

use tourflow_core::analytics::EventKind;
use tourflow_core::error::CoreError;
use tourflow_core::types::DbId;

use crate::models::analytics::{AnalyticsEventRow, CreateAnalyticsEvent};
use crate::models::tour::WidgetTour;
use crate::store::TourStore;
use crate::DbResult;

/// Longest accepted widget session id.
pub const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct WidgetService {
    store: Arc<dyn TourStore>,
}

impl WidgetService {
    pub fn new(store: Arc<dyn TourStore>) -> Self {
        Self { store }
    }

    /// The steps of an active tour in display order.
    pub async fn widget_tour(&self, tour_id: DbId) -> DbResult<WidgetTour> {
        let tour = self
            .store
            .find_tour(tour_id)
            .await?
            .filter(|t| t.status.is_active())
            .ok_or(CoreError::NotFound {
                entity: "Tour",
                id: tour_id,
            })?;

        let steps = self.store.list_steps(tour_id).await?;
        Ok(WidgetTour {
            tour_id: tour.id,
            title: tour.title,
            steps: steps.into_iter().map(Into::into).collect(),
        })
    }

    /// Validate and store one widget event.
    pub async fn record_event(
        &self,
        tour_id: DbId,
        input: &CreateAnalyticsEvent,
    ) -> DbResult<AnalyticsEventRow> {
        let session_id = input.session_id.trim();
        if session_id.is_empty() {
            return Err(CoreError::Validation("session_id must not be empty".to_string()).into());
        }
        if session_id.len() > MAX_SESSION_ID_LEN {
            return Err(CoreError::Validation(format!(
                "session_id must not exceed {MAX_SESSION_ID_LEN} characters"
            ))
            .into());
        }
        if !input.metadata.is_object() {
            return Err(CoreError::Validation("metadata must be a JSON object".to_string()).into());
        }
        let kind = EventKind::parse(&input.event_type, &input.metadata)?;

        if self.store.find_tour(tour_id).await?.is_none() {
            return Err(CoreError::NotFound {
                entity: "Tour",
                id: tour_id,
            }
            .into());
        }

        let input = CreateAnalyticsEvent {
            session_id: session_id.to_string(),
            event_type: kind.as_str().to_string(),
            metadata: input.metadata.clone(),
        };
        let row = self.store.insert_event(tour_id, &input).await?;
        tracing::debug!(tour_id, event = kind.as_str(), "Widget event recorded");
        Ok(row)
    }
}
