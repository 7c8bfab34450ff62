//! Tenant profile mirrored from the identity provider.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tourflow_core::types::{OwnerId, Timestamp};

/// A row from the `profiles` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Profile {
    pub id: OwnerId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Identity fields synced on each upsert.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertProfile {
    pub id: OwnerId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}
