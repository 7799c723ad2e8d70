//! Nav node (page) model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use coedit_core::types::{DbId, Timestamp};

/// A row from the `nav_nodes` table: one page in a document snapshot's
/// navigation forest. `page_id` is the business key stable across
/// snapshots; `parent_page_id` is null for roots.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NavNode {
    pub id: DbId,
    pub document_id: Option<String>,
    pub snapshot_id: Uuid,
    pub page_id: String,
    pub parent_page_id: Option<String>,
    pub title: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a nav node. `sort_order` is assigned by the
/// repository (appended after the current last sibling).
#[derive(Debug, Clone)]
pub struct CreateNavNode {
    pub document_id: Option<String>,
    pub snapshot_id: Uuid,
    pub page_id: String,
    pub parent_page_id: Option<String>,
    pub title: String,
}
