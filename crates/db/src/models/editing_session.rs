//! Editing session model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use coedit_core::types::{DbId, Timestamp};

/// A row from the `editing_sessions` table: one user's current open
/// editing context (document, snapshot, position, dirty flags).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EditingSession {
    pub id: DbId,
    pub user_id: String,
    /// Null until the document has a saved identity.
    pub document_id: Option<String>,
    pub document_version_id: Option<String>,
    pub snapshot_id: Uuid,
    pub current_page_id: Option<String>,
    pub current_block_id: Option<String>,
    pub current_component_id: Option<String>,
    pub pending_save: bool,
    pub pending_nav_change: bool,
    pub pending_page_structure_change: bool,
    pub pending_components_change: bool,
    pub pending_generic_update: bool,
    pub last_action: Timestamp,
    pub last_sync: Timestamp,
    pub origin_ip: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for opening or re-pointing a user's session.
#[derive(Debug, Clone)]
pub struct CreateEditingSession {
    pub user_id: String,
    pub document_id: Option<String>,
    pub document_version_id: Option<String>,
    pub snapshot_id: Uuid,
    pub origin_ip: Option<String>,
}
