//! Membership roles for durable document access.
//!
//! Stored as lowercase TEXT in `document_memberships.role`; the CHECK
//! constraint in the schema must match these values.

use serde::{Deserialize, Serialize};

/// A user's durable role on a document, independent of live sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Exactly one owner exists per document once created.
    Owner,
    Collaborator,
    Viewer,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Collaborator => "collaborator",
            MembershipRole::Viewer => "viewer",
        }
    }

    /// Parse a stored role value. Returns `None` for unknown strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(MembershipRole::Owner),
            "collaborator" => Some(MembershipRole::Collaborator),
            "viewer" => Some(MembershipRole::Viewer),
            _ => None,
        }
    }
}
