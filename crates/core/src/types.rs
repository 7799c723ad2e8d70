/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A structural snapshot identifier. One document may have several
/// snapshots in storage at once; every tree read is scoped to exactly one.
pub type SnapshotId = uuid::Uuid;
