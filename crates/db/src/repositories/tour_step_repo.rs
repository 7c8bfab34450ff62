//! Repository for the `tour_steps` table.
//!
//! Queries that target a single step match on both the step id and its
//! tour id, so a step id from another tour never matches.

use sqlx::PgPool;
use tourflow_core::types::DbId;

use crate::models::step::{NewStep, TourStep, UpdateStep};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, tour_id, step_order, title, description, completion_rate, created_at, updated_at";

/// Provides CRUD and ordering operations for tour steps.
pub struct TourStepRepo;

impl TourStepRepo {
    /// Insert steps for a tour in one statement, returning the rows in order.
    pub async fn create_many(
        pool: &PgPool,
        tour_id: DbId,
        steps: &[NewStep],
    ) -> Result<Vec<TourStep>, sqlx::Error> {
        if steps.is_empty() {
            return Ok(Vec::new());
        }

        let orders: Vec<i32> = steps.iter().map(|s| s.step_order).collect();
        let titles: Vec<&str> = steps.iter().map(|s| s.title.as_str()).collect();
        let descriptions: Vec<&str> = steps.iter().map(|s| s.description.as_str()).collect();

        let query = format!(
            "INSERT INTO tour_steps (tour_id, step_order, title, description, completion_rate) \
             SELECT $1, o, t, d, 0 \
             FROM UNNEST($2::INTEGER[], $3::TEXT[], $4::TEXT[]) AS input(o, t, d) \
             RETURNING {COLUMNS}"
        );
        let mut rows = sqlx::query_as::<_, TourStep>(&query)
            .bind(tour_id)
            .bind(&orders)
            .bind(&titles)
            .bind(&descriptions)
            .fetch_all(pool)
            .await?;
        rows.sort_by_key(|s| (s.step_order, s.id));
        Ok(rows)
    }

    /// Highest `step_order` in a tour, or `None` if it has no steps.
    pub async fn max_order(pool: &PgPool, tour_id: DbId) -> Result<Option<i32>, sqlx::Error> {
        let row: (Option<i32>,) =
            sqlx::query_as("SELECT MAX(step_order) FROM tour_steps WHERE tour_id = $1")
                .bind(tour_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// List a tour's steps by `step_order` (ties broken by id).
    pub async fn list_by_tour(pool: &PgPool, tour_id: DbId) -> Result<Vec<TourStep>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tour_steps WHERE tour_id = $1 ORDER BY step_order, id"
        );
        sqlx::query_as::<_, TourStep>(&query)
            .bind(tour_id)
            .fetch_all(pool)
            .await
    }

    /// List the steps of several tours, grouped by tour then ordered.
    pub async fn list_by_tours(
        pool: &PgPool,
        tour_ids: &[DbId],
    ) -> Result<Vec<TourStep>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tour_steps WHERE tour_id = ANY($1) \
             ORDER BY tour_id, step_order, id"
        );
        sqlx::query_as::<_, TourStep>(&query)
            .bind(tour_ids)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_tour(pool: &PgPool, tour_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tour_steps WHERE tour_id = $1")
            .bind(tour_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Update a step's text. Only non-`None` fields are applied.
    ///
    /// Returns `None` if the step does not exist in `tour_id`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        tour_id: DbId,
        input: &UpdateStep,
    ) -> Result<Option<TourStep>, sqlx::Error> {
        let query = format!(
            "UPDATE tour_steps SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                updated_at = NOW() \
             WHERE id = $1 AND tour_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TourStep>(&query)
            .bind(id)
            .bind(tour_id)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_order(
        pool: &PgPool,
        id: DbId,
        tour_id: DbId,
        order: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tour_steps SET step_order = $3, updated_at = NOW() \
             WHERE id = $1 AND tour_id = $2",
        )
        .bind(id)
        .bind(tour_id)
        .bind(order)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_completion_rate(
        pool: &PgPool,
        id: DbId,
        tour_id: DbId,
        rate: f64,
    ) -> Result<Option<TourStep>, sqlx::Error> {
        let query = format!(
            "UPDATE tour_steps SET completion_rate = $3, updated_at = NOW() \
             WHERE id = $1 AND tour_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TourStep>(&query)
            .bind(id)
            .bind(tour_id)
            .bind(rate)
            .fetch_optional(pool)
            .await
    }

    /// Delete a step. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId, tour_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tour_steps WHERE id = $1 AND tour_id = $2")
            .bind(id)
            .bind(tour_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
