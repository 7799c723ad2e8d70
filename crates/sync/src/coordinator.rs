//! The synchronization coordinator.
//!
//! Every operation is a short sequence of reads/writes against the
//! shared store; there is no in-process state, so any number of service
//! instances behave consistently. Soft locks are advisory: `can_edit`
//! and the write it guards are separate operations, which is accepted
//! for the human-interaction cadence this protocol targets.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use coedit_core::error::CoreError;
use coedit_core::roles::MembershipRole;
use coedit_core::sync::{classify_position, SyncFlag};
use coedit_db::models::editing_session::{CreateEditingSession, EditingSession};
use coedit_db::models::membership::{CreateMembership, DocumentMembership};
use coedit_db::repositories::{EditingSessionRepo, MembershipRepo};

use crate::config::SyncConfig;
use crate::error::SyncResult;

/// The (document, version, snapshot) triple a session resolves to.
///
/// Exporters and structure queries receive exactly this, resolved once
/// per request, and pass the snapshot id down unchanged through every
/// tree query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRef {
    pub document_id: Option<String>,
    pub document_version_id: Option<String>,
    pub snapshot_id: Uuid,
}

impl From<&EditingSession> for SnapshotRef {
    fn from(session: &EditingSession) -> Self {
        Self {
            document_id: session.document_id.clone(),
            document_version_id: session.document_version_id.clone(),
            snapshot_id: session.snapshot_id,
        }
    }
}

/// Result of closing a session.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedSession {
    pub session: EditingSession,
    /// True when the closed row was the last one for its
    /// (document, version, snapshot) tuple, so the caller may merge the
    /// document identity into a new snapshot ("save as" transitions).
    pub was_last: bool,
}

/// Stateless coordination logic over the session and membership stores.
pub struct Coordinator;

impl Coordinator {
    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Open a fresh editing context on a newly generated snapshot.
    ///
    /// If the user already had a session it is re-pointed at the new
    /// snapshot; a user never holds two sessions.
    pub async fn open_session(
        pool: &PgPool,
        document_id: Option<&str>,
        document_version_id: Option<&str>,
        user_id: &str,
        origin_ip: Option<&str>,
    ) -> SyncResult<EditingSession> {
        let snapshot_id = Uuid::now_v7();
        let session = EditingSessionRepo::upsert_for_user(
            pool,
            &CreateEditingSession {
                user_id: user_id.to_string(),
                document_id: document_id.map(str::to_string),
                document_version_id: document_version_id.map(str::to_string),
                snapshot_id,
                origin_ip: origin_ip.map(str::to_string),
            },
        )
        .await?;

        tracing::info!(
            user_id,
            document_id = ?document_id,
            snapshot_id = %snapshot_id,
            "Session opened"
        );
        Ok(session)
    }

    /// Attach a user to an existing snapshot (collaborative join).
    ///
    /// The target snapshot must have at least one active session, whose
    /// `document_version_id` the joiner inherits. Never creates a new,
    /// disconnected snapshot.
    pub async fn join_session(
        pool: &PgPool,
        document_id: &str,
        snapshot_id: Uuid,
        user_id: &str,
        origin_ip: Option<&str>,
    ) -> SyncResult<EditingSession> {
        let peers = EditingSessionRepo::list_for_snapshot(pool, snapshot_id).await?;
        // Prefer another user's session as the version source; a lone
        // re-join of one's own snapshot is still a valid join.
        let Some(peer) = peers
            .iter()
            .find(|s| s.user_id != user_id)
            .or_else(|| peers.first())
        else {
            return Err(CoreError::SnapshotJoinNotFound {
                document_id: document_id.to_string(),
            }
            .into());
        };

        let session = EditingSessionRepo::upsert_for_user(
            pool,
            &CreateEditingSession {
                user_id: user_id.to_string(),
                document_id: Some(document_id.to_string()),
                document_version_id: peer.document_version_id.clone(),
                snapshot_id,
                origin_ip: origin_ip.map(str::to_string),
            },
        )
        .await?;

        tracing::info!(
            user_id,
            document_id,
            snapshot_id = %snapshot_id,
            "Session joined"
        );
        Ok(session)
    }

    /// Join by document, preferring an exact snapshot match and falling
    /// back to the first active session for the document.
    ///
    /// The joiner's own session is rewritten to share the found view.
    /// Fails with [`CoreError::SnapshotJoinNotFound`] when no active
    /// session exists; the caller must not silently open a new snapshot
    /// when the intent was to join.
    pub async fn join_by_document_or_snapshot(
        pool: &PgPool,
        document_id: &str,
        snapshot_id: Option<Uuid>,
        user_id: &str,
        origin_ip: Option<&str>,
    ) -> SyncResult<SnapshotRef> {
        let mut candidates = match snapshot_id {
            Some(snapshot) => {
                EditingSessionRepo::list_scoped(pool, document_id, None, Some(snapshot)).await?
            }
            None => Vec::new(),
        };
        if candidates.is_empty() {
            candidates = EditingSessionRepo::list_scoped(pool, document_id, None, None).await?;
        }

        let Some(target) = candidates
            .iter()
            .find(|s| s.user_id != user_id)
            .or_else(|| candidates.first())
        else {
            return Err(CoreError::SnapshotJoinNotFound {
                document_id: document_id.to_string(),
            }
            .into());
        };
        let target = SnapshotRef::from(target);

        EditingSessionRepo::upsert_for_user(
            pool,
            &CreateEditingSession {
                user_id: user_id.to_string(),
                document_id: target.document_id.clone(),
                document_version_id: target.document_version_id.clone(),
                snapshot_id: target.snapshot_id,
                origin_ip: origin_ip.map(str::to_string),
            },
        )
        .await?;

        tracing::info!(
            user_id,
            document_id,
            snapshot_id = %target.snapshot_id,
            "Session merged into shared snapshot"
        );
        Ok(target)
    }

    /// Close the caller's session.
    ///
    /// Returns `None` (after logging the desync) if the caller had no
    /// session. Otherwise reports whether the closed row was the last
    /// for its (document, version, snapshot) tuple.
    pub async fn close_session(
        pool: &PgPool,
        user_id: &str,
    ) -> SyncResult<Option<ClosedSession>> {
        let Some(session) = EditingSessionRepo::delete_by_user(pool, user_id).await? else {
            tracing::error!(user_id, "Close requested but no session exists");
            return Ok(None);
        };

        let remaining = match &session.document_id {
            Some(document_id) => {
                EditingSessionRepo::list_scoped(
                    pool,
                    document_id,
                    session.document_version_id.as_deref(),
                    Some(session.snapshot_id),
                )
                .await?
            }
            // Unsaved document: the snapshot is the only identity.
            None => EditingSessionRepo::list_for_snapshot(pool, session.snapshot_id).await?,
        };
        let was_last = remaining.is_empty();

        tracing::info!(
            user_id,
            snapshot_id = %session.snapshot_id,
            was_last,
            "Session closed"
        );
        Ok(Some(ClosedSession { session, was_last }))
    }

    // -----------------------------------------------------------------------
    // Position and sync flags
    // -----------------------------------------------------------------------

    /// Update the caller's focus and raise the dirty flag matching the
    /// structural level that changed.
    ///
    /// A missing session indicates a client/server desync: it is logged
    /// and degrades to `false` rather than failing the request.
    pub async fn update_position(
        pool: &PgPool,
        user_id: &str,
        page_id: Option<&str>,
        block_id: Option<&str>,
        component_id: Option<&str>,
    ) -> SyncResult<bool> {
        let flag = classify_position(page_id, block_id, component_id);
        let updated = EditingSessionRepo::update_position(
            pool, user_id, page_id, block_id, component_id, flag,
        )
        .await?;
        if !updated {
            tracing::error!(user_id, "Position update for a user with no session");
        } else {
            tracing::debug!(user_id, flag = ?flag, "Position updated");
        }
        Ok(updated)
    }

    /// Raise the advisory save flag read by other clients before they
    /// attempt their own save.
    pub async fn mark_saving(pool: &PgPool, user_id: &str) -> SyncResult<bool> {
        Self::set_saving(pool, user_id, true).await
    }

    /// Lower the advisory save flag.
    pub async fn clear_saving(pool: &PgPool, user_id: &str) -> SyncResult<bool> {
        Self::set_saving(pool, user_id, false).await
    }

    async fn set_saving(pool: &PgPool, user_id: &str, saving: bool) -> SyncResult<bool> {
        let updated = EditingSessionRepo::set_saving(pool, user_id, saving).await?;
        if !updated {
            tracing::error!(user_id, saving, "Save flag toggle for a user with no session");
        }
        Ok(updated)
    }

    /// Whether any session on the snapshot is currently saving.
    ///
    /// A document without a saved identity cannot have concurrent
    /// savers, so `None` yields `false`.
    pub async fn anyone_saving(
        pool: &PgPool,
        document_id: Option<&str>,
        snapshot_id: Uuid,
    ) -> SyncResult<bool> {
        match document_id {
            Some(document_id) => {
                Ok(EditingSessionRepo::anyone_saving(pool, document_id, snapshot_id).await?)
            }
            None => Ok(false),
        }
    }

    /// Lower consumed dirty flags and record the poll. Part of the
    /// client polling contract; a missing session degrades to `false`.
    pub async fn acknowledge_flags(
        pool: &PgPool,
        user_id: &str,
        flags: &[SyncFlag],
    ) -> SyncResult<bool> {
        let cleared = EditingSessionRepo::clear_flags(pool, user_id, flags).await?;
        if cleared {
            EditingSessionRepo::touch_sync(pool, user_id).await?;
        } else {
            tracing::error!(user_id, "Flag acknowledgement for a user with no session");
        }
        Ok(cleared)
    }

    // -----------------------------------------------------------------------
    // Conflict detection
    // -----------------------------------------------------------------------

    /// Advisory soft-lock check: can `requesting_user` start editing the
    /// given component (or, when no component is targeted, the block)?
    ///
    /// Walks every other active session on the document; a session
    /// focused on the same component, or the same block at block
    /// granularity, denies the edit. Purely advisory: no check-and-set.
    pub async fn can_edit(
        pool: &PgPool,
        document_id: &str,
        component_id: Option<&str>,
        block_id: Option<&str>,
        requesting_user: &str,
    ) -> SyncResult<bool> {
        let sessions = EditingSessionRepo::list_scoped(pool, document_id, None, None).await?;

        for session in sessions.iter().filter(|s| s.user_id != requesting_user) {
            if let Some(component_id) = component_id {
                if session.current_component_id.as_deref() == Some(component_id) {
                    tracing::debug!(
                        requesting_user,
                        holder = %session.user_id,
                        component_id,
                        "Edit denied: component in use"
                    );
                    return Ok(false);
                }
            } else if let Some(block_id) = block_id {
                if session.current_block_id.as_deref() == Some(block_id) {
                    tracing::debug!(
                        requesting_user,
                        holder = %session.user_id,
                        block_id,
                        "Edit denied: block in use"
                    );
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Whether the caller is the only user with a session on the given
    /// (document, version, snapshot) scope.
    ///
    /// A caller who is not among the sessions at all is a logged
    /// inconsistency and yields `false`.
    pub async fn is_sole_editor(
        pool: &PgPool,
        user_id: &str,
        document_id: &str,
        document_version_id: Option<&str>,
        snapshot_id: Uuid,
    ) -> SyncResult<bool> {
        let sessions = EditingSessionRepo::list_scoped(
            pool,
            document_id,
            document_version_id,
            Some(snapshot_id),
        )
        .await?;

        if !sessions.iter().any(|s| s.user_id == user_id) {
            tracing::error!(
                user_id,
                document_id,
                snapshot_id = %snapshot_id,
                "Sole-editor check for a user who is not editing"
            );
            return Ok(false);
        }
        Ok(sessions.len() == 1)
    }

    // -----------------------------------------------------------------------
    // Snapshot resolution
    // -----------------------------------------------------------------------

    /// Resolve the caller's current (document, version, snapshot) triple.
    ///
    /// The single entry point for exporters and structure queries; the
    /// returned snapshot id must be passed unchanged through every tree
    /// query made on the caller's behalf.
    pub async fn resolve_snapshot(pool: &PgPool, user_id: &str) -> SyncResult<SnapshotRef> {
        let session = EditingSessionRepo::find_by_user(pool, user_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound {
                user_id: user_id.to_string(),
            })?;
        Ok(SnapshotRef::from(&session))
    }

    /// Sessions idle past the configured horizon, for the external
    /// cleanup job. The coordinator itself never reaps.
    pub async fn list_stale_sessions(
        pool: &PgPool,
        config: &SyncConfig,
    ) -> SyncResult<Vec<EditingSession>> {
        Ok(EditingSessionRepo::list_stale(pool, config.session_stale_timeout_secs).await?)
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Ensure the user holds a membership on the document with the
    /// desired role, creating or re-roling as needed.
    ///
    /// Owner protection: an existing owner row is never re-roled, and a
    /// second owner is never created. Both refusals are logged and
    /// reported as `None`; the original membership is preserved.
    pub async fn ensure_membership(
        pool: &PgPool,
        document_id: &str,
        user_id: &str,
        desired_role: MembershipRole,
        origin_ip: Option<&str>,
    ) -> SyncResult<Option<DocumentMembership>> {
        if let Some(existing) = MembershipRepo::find(pool, document_id, user_id).await? {
            if existing.role == desired_role {
                MembershipRepo::touch(pool, document_id, user_id).await?;
                return Ok(Some(existing));
            }
            if existing.role == MembershipRole::Owner {
                tracing::error!(
                    document_id,
                    user_id,
                    desired_role = desired_role.as_str(),
                    "Refusing to change the owner's role"
                );
                return Ok(None);
            }
            if desired_role == MembershipRole::Owner
                && MembershipRepo::find_owner(pool, document_id).await?.is_some()
            {
                tracing::error!(document_id, user_id, "Refusing to install a second owner");
                return Ok(None);
            }
            return Ok(
                MembershipRepo::update_role(pool, document_id, user_id, desired_role, origin_ip)
                    .await?,
            );
        }

        if desired_role == MembershipRole::Owner
            && MembershipRepo::find_owner(pool, document_id).await?.is_some()
        {
            tracing::error!(document_id, user_id, "Refusing to install a second owner");
            return Ok(None);
        }

        let membership = MembershipRepo::create(
            pool,
            &CreateMembership {
                document_id: document_id.to_string(),
                user_id: user_id.to_string(),
                role: desired_role,
                origin_ip: origin_ip.map(str::to_string),
            },
        )
        .await?;
        Ok(Some(membership))
    }

    /// Bootstrap ownership when a document is first created.
    ///
    /// No-op if any membership already exists. Otherwise the owner is
    /// the last-known author of prior content when one is known,
    /// falling back to the acting user.
    pub async fn ensure_owner(
        pool: &PgPool,
        document_id: &str,
        acting_user: &str,
        historical_author: Option<&str>,
        origin_ip: Option<&str>,
    ) -> SyncResult<Option<DocumentMembership>> {
        if MembershipRepo::count_for_document(pool, document_id).await? > 0 {
            return Ok(None);
        }

        let owner_user = historical_author.unwrap_or(acting_user);
        let membership = MembershipRepo::create(
            pool,
            &CreateMembership {
                document_id: document_id.to_string(),
                user_id: owner_user.to_string(),
                role: MembershipRole::Owner,
                origin_ip: origin_ip.map(str::to_string),
            },
        )
        .await?;

        tracing::info!(document_id, owner = owner_user, "Owner bootstrapped");
        Ok(Some(membership))
    }

    /// A document's members, most recently active first.
    pub async fn list_members(
        pool: &PgPool,
        document_id: &str,
    ) -> SyncResult<Vec<DocumentMembership>> {
        Ok(MembershipRepo::list_for_document(pool, document_id).await?)
    }
}
