/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Tenant identity as issued by the authentication service.
pub type OwnerId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
