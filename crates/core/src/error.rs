#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The caller has no current editing session. Indicates a
    /// client/server desync; callers generally recover by returning a
    /// false/empty result rather than failing the request.
    #[error("No editing session for user {user_id}")]
    SessionNotFound { user_id: String },

    /// An attempt to change or overwrite a document's owner membership.
    /// The original membership is preserved.
    #[error("Document {document_id} already has an owner")]
    OwnerConflict { document_id: String },

    /// A join referenced a document/snapshot with no active session.
    /// Distinct from a generic not-found so the caller can surface a
    /// "cannot join" result instead of silently opening a new snapshot.
    #[error("No active session to join for document {document_id}")]
    SnapshotJoinNotFound { document_id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
