use coedit_core::error::CoreError;

/// Service-level error type for coordinator operations.
///
/// Domain conditions (missing session, owner protection, failed join)
/// surface as [`CoreError`] variants; only storage failures are expected
/// to propagate as hard errors through the request pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience alias for coordinator return values.
pub type SyncResult<T> = Result<T, SyncError>;
