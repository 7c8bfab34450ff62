//! Repository for the `tours` table.
//!
//! Every tenant-facing query filters on both `id` and `user_id`.

use sqlx::PgPool;
use tourflow_core::tour::TourStatus;
use tourflow_core::types::{DbId, OwnerId};

use crate::models::tour::{NewTour, RecentTour, StepCountDrift, Tour, TourTotals, UpdateTour};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, title, description, status, total_steps, created_at, updated_at";

/// Provides CRUD operations for tours.
pub struct TourRepo;

impl TourRepo {
    /// Insert a new tour, returning the created row.
    pub async fn create(pool: &PgPool, owner: OwnerId, input: &NewTour) -> Result<Tour, sqlx::Error> {
        let query = format!(
            "INSERT INTO tours (user_id, title, description, status, total_steps) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tour>(&query)
            .bind(owner)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.status.as_str())
            .bind(input.total_steps)
            .fetch_one(pool)
            .await
    }

    /// Find a tour by id regardless of owner. Used by the public widget path.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tour>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tours WHERE id = $1");
        sqlx::query_as::<_, Tour>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a tour owned by `owner`.
    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        owner: OwnerId,
    ) -> Result<Option<Tour>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tours WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Tour>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's tours, newest first.
    pub async fn list_by_owner(pool: &PgPool, owner: OwnerId) -> Result<Vec<Tour>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tours WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Tour>(&query)
            .bind(owner)
            .fetch_all(pool)
            .await
    }

    /// The `limit` most recently created tours of an owner.
    pub async fn list_recent(
        pool: &PgPool,
        owner: OwnerId,
        limit: i64,
    ) -> Result<Vec<RecentTour>, sqlx::Error> {
        sqlx::query_as::<_, RecentTour>(
            "SELECT id, title, total_steps, status FROM tours \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(owner)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Tour count, active tour count and summed `total_steps` for an owner.
    pub async fn totals(pool: &PgPool, owner: OwnerId) -> Result<TourTotals, sqlx::Error> {
        sqlx::query_as::<_, TourTotals>(
            "SELECT COUNT(*) AS total_tours, \
                    COUNT(*) FILTER (WHERE status = $2) AS active_tours, \
                    COALESCE(SUM(total_steps), 0)::BIGINT AS total_steps \
             FROM tours WHERE user_id = $1",
        )
        .bind(owner)
        .bind(TourStatus::Active.as_str())
        .fetch_one(pool)
        .await
    }

    /// Update tour metadata. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row matches both `id` and `owner`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        owner: OwnerId,
        input: &UpdateTour,
    ) -> Result<Option<Tour>, sqlx::Error> {
        let query = format!(
            "UPDATE tours SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                status = COALESCE($5, status), \
                updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tour>(&query)
            .bind(id)
            .bind(owner)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.status.map(TourStatus::as_str))
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the cached step count.
    pub async fn set_total_steps(pool: &PgPool, id: DbId, total: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tours SET total_steps = GREATEST($2, 0), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(total)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a tour. Steps and analytics rows go with it via `ON DELETE CASCADE`.
    pub async fn delete(pool: &PgPool, id: DbId, owner: OwnerId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Tours whose cached `total_steps` differs from their step row count.
    pub async fn find_step_count_drift(pool: &PgPool) -> Result<Vec<StepCountDrift>, sqlx::Error> {
        sqlx::query_as::<_, StepCountDrift>(
            "SELECT t.id AS tour_id, t.total_steps AS cached, COUNT(s.id) AS actual \
             FROM tours t LEFT JOIN tour_steps s ON s.tour_id = t.id \
             GROUP BY t.id, t.total_steps \
             HAVING t.total_steps <> COUNT(s.id) \
             ORDER BY t.id",
        )
        .fetch_all(pool)
        .await
    }
}
