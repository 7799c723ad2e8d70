//! Repository for the `document_memberships` table.

use sqlx::PgPool;

use coedit_core::roles::MembershipRole;

use crate::models::membership::{CreateMembership, DocumentMembership};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, document_id, user_id, role, last_action, origin_ip, created_at, updated_at";

/// Provides CRUD operations for durable document memberships.
///
/// The partial unique index `uq_document_memberships_owner` guarantees at
/// most one owner row per document; the role-change policy on top of it
/// lives in the coordinator.
pub struct MembershipRepo;

impl MembershipRepo {
    /// Insert a new membership, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMembership,
    ) -> Result<DocumentMembership, sqlx::Error> {
        let query = format!(
            "INSERT INTO document_memberships (document_id, user_id, role, origin_ip)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentMembership>(&query)
            .bind(&input.document_id)
            .bind(&input.user_id)
            .bind(input.role)
            .bind(&input.origin_ip)
            .fetch_one(pool)
            .await
    }

    /// Find one user's membership on a document.
    pub async fn find(
        pool: &PgPool,
        document_id: &str,
        user_id: &str,
    ) -> Result<Option<DocumentMembership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM document_memberships
             WHERE document_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, DocumentMembership>(&query)
            .bind(document_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Change an existing membership's role, returning the updated row.
    /// Returns `None` if the membership does not exist.
    pub async fn update_role(
        pool: &PgPool,
        document_id: &str,
        user_id: &str,
        role: MembershipRole,
        origin_ip: Option<&str>,
    ) -> Result<Option<DocumentMembership>, sqlx::Error> {
        let query = format!(
            "UPDATE document_memberships SET role = $3, origin_ip = $4, last_action = NOW()
             WHERE document_id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentMembership>(&query)
            .bind(document_id)
            .bind(user_id)
            .bind(role)
            .bind(origin_ip)
            .fetch_optional(pool)
            .await
    }

    /// Bump a member's `last_action`. Returns `false` if no row matched.
    pub async fn touch(
        pool: &PgPool,
        document_id: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE document_memberships SET last_action = NOW()
             WHERE document_id = $1 AND user_id = $2",
        )
        .bind(document_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List a document's members, most recently active first.
    pub async fn list_for_document(
        pool: &PgPool,
        document_id: &str,
    ) -> Result<Vec<DocumentMembership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM document_memberships
             WHERE document_id = $1
             ORDER BY last_action DESC"
        );
        sqlx::query_as::<_, DocumentMembership>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await
    }

    /// Count memberships for a document.
    pub async fn count_for_document(
        pool: &PgPool,
        document_id: &str,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM document_memberships WHERE document_id = $1")
                .bind(document_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Find the document's owner membership, if one exists.
    pub async fn find_owner(
        pool: &PgPool,
        document_id: &str,
    ) -> Result<Option<DocumentMembership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM document_memberships
             WHERE document_id = $1 AND role = 'owner'"
        );
        sqlx::query_as::<_, DocumentMembership>(&query)
            .bind(document_id)
            .fetch_optional(pool)
            .await
    }
}
