//! Repository for the `tour_analytics` table.

use sqlx::PgPool;
use tourflow_core::types::{DbId, Timestamp};

use crate::models::analytics::{AnalyticsEventRow, CreateAnalyticsEvent};

const COLUMNS: &str = "id, tour_id, session_id, type, metadata, occurred_at";

/// Insert and query widget analytics events.
pub struct AnalyticsRepo;

impl AnalyticsRepo {
    pub async fn create(
        pool: &PgPool,
        tour_id: DbId,
        input: &CreateAnalyticsEvent,
    ) -> Result<AnalyticsEventRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO tour_analytics (tour_id, session_id, type, metadata) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnalyticsEventRow>(&query)
            .bind(tour_id)
            .bind(&input.session_id)
            .bind(&input.event_type)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// Events of the given types for a set of tours, oldest first.
    ///
    /// `since` restricts to events at or after that instant.
    pub async fn list(
        pool: &PgPool,
        tour_ids: &[DbId],
        event_types: &[&str],
        since: Option<Timestamp>,
    ) -> Result<Vec<AnalyticsEventRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tour_analytics \
             WHERE tour_id = ANY($1) AND type = ANY($2) \
               AND ($3::TIMESTAMPTZ IS NULL OR occurred_at >= $3) \
             ORDER BY occurred_at, id"
        );
        sqlx::query_as::<_, AnalyticsEventRow>(&query)
            .bind(tour_ids)
            .bind(event_types)
            .bind(since)
            .fetch_all(pool)
            .await
    }
}
