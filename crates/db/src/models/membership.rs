//! Document membership model and DTOs.

use serde::Serialize;
use sqlx::FromRow;

use coedit_core::roles::MembershipRole;
use coedit_core::types::{DbId, Timestamp};

/// A row from the `document_memberships` table: a durable
/// (document, user, role) association, independent of live sessions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentMembership {
    pub id: DbId,
    pub document_id: String,
    pub user_id: String,
    pub role: MembershipRole,
    pub last_action: Timestamp,
    pub origin_ip: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a membership.
#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub document_id: String,
    pub user_id: String,
    pub role: MembershipRole,
    pub origin_ip: Option<String>,
}
