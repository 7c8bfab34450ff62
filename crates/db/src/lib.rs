//! Persistence and services for tours, steps, analytics and profiles.
//!
//! - [`repositories`] -- Postgres queries, one zero-sized repo per table.
//! - [`store`] -- the injected [`store::TourStore`] seam with Postgres and
//!   in-memory implementations.
//! - [`lifecycle`] -- tour/step mutations that keep ordering and counts
//!   consistent.
//! - [`dashboard`] -- read-only aggregations for the dashboard views.
//! - [`widget`] -- the public data contract consumed by the embeddable widget.

use sqlx::postgres::PgPoolOptions;
use tourflow_core::error::CoreError;

pub mod dashboard;
pub mod lifecycle;
pub mod models;
pub mod repositories;
pub mod store;
pub mod widget;

pub type DbPool = sqlx::PgPool;

/// Errors surfaced by stores and the services built on them.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A domain-level error (validation, ownership, missing rows).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// The backing store could not serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run a trivial query to confirm the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
