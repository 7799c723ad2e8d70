//! Component (content unit) model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use coedit_core::types::{DbId, Timestamp};

/// A row from the `components` table: one editable content unit inside a
/// block. Never visible across snapshot boundaries; its `snapshot_id`
/// always matches the owning block's.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Component {
    pub id: DbId,
    pub document_id: Option<String>,
    pub snapshot_id: Uuid,
    pub page_id: String,
    pub block_id: String,
    pub component_id: String,
    pub component_type_name: String,
    pub rendered_html: String,
    pub properties_blob: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a component.
#[derive(Debug, Clone)]
pub struct CreateComponent {
    pub document_id: Option<String>,
    pub snapshot_id: Uuid,
    pub page_id: String,
    pub block_id: String,
    pub component_id: String,
    pub component_type_name: String,
    pub rendered_html: String,
    pub properties_blob: String,
}
