//! Page block model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use coedit_core::types::{DbId, Timestamp};

/// A row from the `page_blocks` table: an ordered block on one page of
/// one snapshot.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PageBlock {
    pub id: DbId,
    pub document_id: Option<String>,
    pub snapshot_id: Uuid,
    pub page_id: String,
    pub block_id: String,
    pub name: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a page block.
#[derive(Debug, Clone)]
pub struct CreatePageBlock {
    pub document_id: Option<String>,
    pub snapshot_id: Uuid,
    pub page_id: String,
    pub block_id: String,
    pub name: String,
}
