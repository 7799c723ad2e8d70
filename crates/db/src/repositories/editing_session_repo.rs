//! Repository for the `editing_sessions` table.

use sqlx::PgPool;
use uuid::Uuid;

use coedit_core::sync::SyncFlag;

use crate::models::editing_session::{CreateEditingSession, EditingSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, document_id, document_version_id, snapshot_id, \
                       current_page_id, current_block_id, current_component_id, \
                       pending_save, pending_nav_change, pending_page_structure_change, \
                       pending_components_change, pending_generic_update, \
                       last_action, last_sync, origin_ip, created_at, updated_at";

/// Provides CRUD operations for editing sessions.
///
/// A user has at most one session row; pointing the user at a different
/// document or snapshot rewrites that row rather than inserting another.
pub struct EditingSessionRepo;

impl EditingSessionRepo {
    /// Insert or re-point the caller's session row, returning it.
    ///
    /// On conflict the existing row is rewritten to the new document and
    /// snapshot, position and dirty flags are reset, and `last_action`
    /// is bumped.
    pub async fn upsert_for_user(
        pool: &PgPool,
        input: &CreateEditingSession,
    ) -> Result<EditingSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO editing_sessions (user_id, document_id, document_version_id, snapshot_id, origin_ip)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id) DO UPDATE SET
                document_id = EXCLUDED.document_id,
                document_version_id = EXCLUDED.document_version_id,
                snapshot_id = EXCLUDED.snapshot_id,
                origin_ip = EXCLUDED.origin_ip,
                current_page_id = NULL,
                current_block_id = NULL,
                current_component_id = NULL,
                pending_save = false,
                pending_nav_change = false,
                pending_page_structure_change = false,
                pending_components_change = false,
                pending_generic_update = false,
                last_action = NOW(),
                last_sync = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EditingSession>(&query)
            .bind(&input.user_id)
            .bind(&input.document_id)
            .bind(&input.document_version_id)
            .bind(input.snapshot_id)
            .bind(&input.origin_ip)
            .fetch_one(pool)
            .await
    }

    /// Find the caller's current session, if any.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Option<EditingSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM editing_sessions WHERE user_id = $1");
        sqlx::query_as::<_, EditingSession>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List active sessions for a document, optionally narrowed by
    /// version and/or snapshot. This is the primitive every scoped
    /// lookup in the coordinator is built on.
    pub async fn list_scoped(
        pool: &PgPool,
        document_id: &str,
        document_version_id: Option<&str>,
        snapshot_id: Option<Uuid>,
    ) -> Result<Vec<EditingSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM editing_sessions
             WHERE document_id = $1
               AND ($2::text IS NULL OR document_version_id = $2)
               AND ($3::uuid IS NULL OR snapshot_id = $3)
             ORDER BY last_action DESC"
        );
        sqlx::query_as::<_, EditingSession>(&query)
            .bind(document_id)
            .bind(document_version_id)
            .bind(snapshot_id)
            .fetch_all(pool)
            .await
    }

    /// List all sessions attached to a snapshot, regardless of document.
    pub async fn list_for_snapshot(
        pool: &PgPool,
        snapshot_id: Uuid,
    ) -> Result<Vec<EditingSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM editing_sessions
             WHERE snapshot_id = $1
             ORDER BY last_action DESC"
        );
        sqlx::query_as::<_, EditingSession>(&query)
            .bind(snapshot_id)
            .fetch_all(pool)
            .await
    }

    /// Update the caller's focus position and raise the given dirty
    /// flag. A generic update also clears the position columns.
    ///
    /// Returns `false` if the caller has no session row.
    pub async fn update_position(
        pool: &PgPool,
        user_id: &str,
        page_id: Option<&str>,
        block_id: Option<&str>,
        component_id: Option<&str>,
        flag: SyncFlag,
    ) -> Result<bool, sqlx::Error> {
        let (page_id, block_id, component_id) = match flag {
            SyncFlag::GenericUpdate => (None, None, None),
            _ => (page_id, block_id, component_id),
        };
        let query = format!(
            "UPDATE editing_sessions SET
                current_page_id = $2,
                current_block_id = $3,
                current_component_id = $4,
                {flag_column} = true,
                last_action = NOW()
             WHERE user_id = $1",
            flag_column = flag.column()
        );
        let result = sqlx::query(&query)
            .bind(user_id)
            .bind(page_id)
            .bind(block_id)
            .bind(component_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Raise or lower the advisory save flag. Returns `false` if the
    /// caller has no session row.
    pub async fn set_saving(
        pool: &PgPool,
        user_id: &str,
        saving: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE editing_sessions SET pending_save = $2, last_action = NOW()
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(saving)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lower the given dirty flags after a client has consumed them.
    /// Returns `false` if the caller has no session row.
    pub async fn clear_flags(
        pool: &PgPool,
        user_id: &str,
        flags: &[SyncFlag],
    ) -> Result<bool, sqlx::Error> {
        if flags.is_empty() {
            return Ok(Self::find_by_user(pool, user_id).await?.is_some());
        }
        let assignments: Vec<String> = flags
            .iter()
            .map(|f| format!("{} = false", f.column()))
            .collect();
        let query = format!(
            "UPDATE editing_sessions SET {} WHERE user_id = $1",
            assignments.join(", ")
        );
        let result = sqlx::query(&query).bind(user_id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record that the caller polled for changes.
    pub async fn touch_sync(pool: &PgPool, user_id: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE editing_sessions SET last_sync = NOW() WHERE user_id = $1")
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any session on the given snapshot currently has the save
    /// flag raised.
    pub async fn anyone_saving(
        pool: &PgPool,
        document_id: &str,
        snapshot_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM editing_sessions
             WHERE document_id = $1 AND snapshot_id = $2 AND pending_save = true",
        )
        .bind(document_id)
        .bind(snapshot_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    /// Sessions whose `last_action` is older than `stale_secs`. The core
    /// never deletes these itself; the external cleanup job decides.
    pub async fn list_stale(
        pool: &PgPool,
        stale_secs: i64,
    ) -> Result<Vec<EditingSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM editing_sessions
             WHERE last_action < NOW() - ($1 || ' seconds')::interval
             ORDER BY last_action"
        );
        sqlx::query_as::<_, EditingSession>(&query)
            .bind(stale_secs.to_string())
            .fetch_all(pool)
            .await
    }

    /// Remove the caller's session, returning the deleted row so the
    /// caller can detect last-session transitions.
    pub async fn delete_by_user(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Option<EditingSession>, sqlx::Error> {
        let query = format!(
            "DELETE FROM editing_sessions WHERE user_id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EditingSession>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Re-point every session on a snapshot at a new document identity.
    /// Used when a temporary document id is promoted to a permanent one.
    pub async fn rebind_document(
        tx: &mut sqlx::PgConnection,
        old_document_id: Option<&str>,
        new_document_id: &str,
        snapshot_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE editing_sessions SET document_id = $2
             WHERE snapshot_id = $3
               AND (document_id = $1 OR ($1::text IS NULL AND document_id IS NULL))",
        )
        .bind(old_document_id)
        .bind(new_document_id)
        .bind(snapshot_id)
        .execute(tx)
        .await?;
        Ok(result.rows_affected())
    }
}
