//! Repository for the `profiles` table.

use sqlx::PgPool;

use crate::models::profile::{Profile, UpsertProfile};

const COLUMNS: &str = "id, email, display_name, created_at, updated_at";

pub struct ProfileRepo;

impl ProfileRepo {
    /// Create the profile or refresh its identity fields.
    pub async fn upsert(pool: &PgPool, input: &UpsertProfile) -> Result<Profile, sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles (id, email, display_name) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE \
             SET email = EXCLUDED.email, \
                 display_name = EXCLUDED.display_name, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(input.id)
            .bind(&input.email)
            .bind(&input.display_name)
            .fetch_one(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
