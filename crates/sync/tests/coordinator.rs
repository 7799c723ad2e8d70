//! Integration tests for the synchronization coordinator, covering the
//! collaborative scenarios the protocol exists for: shared joins,
//! last-user detection, advisory edit conflicts, owner protection, and
//! snapshot resolution for exporters.

use assert_matches::assert_matches;
use sqlx::PgPool;
use uuid::Uuid;

use coedit_core::error::CoreError;
use coedit_core::roles::MembershipRole;
use coedit_core::sync::SyncFlag;
use coedit_sync::{Coordinator, SyncConfig, SyncError};

// ---------------------------------------------------------------------------
// Open / join
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn open_then_join_shares_the_snapshot(pool: PgPool) {
    let u1 = Coordinator::open_session(&pool, Some("doc-a"), Some("v1"), "u1", None)
        .await
        .unwrap();

    let u2 = Coordinator::join_session(&pool, "doc-a", u1.snapshot_id, "u2", None)
        .await
        .unwrap();

    assert_eq!(u2.document_id.as_deref(), Some("doc-a"));
    assert_eq!(u2.document_version_id.as_deref(), Some("v1"));
    assert_eq!(u2.snapshot_id, u1.snapshot_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn join_of_a_dead_snapshot_is_refused(pool: PgPool) {
    let result = Coordinator::join_session(&pool, "doc-a", Uuid::now_v7(), "u2", None).await;
    assert_matches!(
        result,
        Err(SyncError::Core(CoreError::SnapshotJoinNotFound { .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn join_by_document_falls_back_to_any_active_session(pool: PgPool) {
    let u1 = Coordinator::open_session(&pool, Some("doc-a"), Some("v1"), "u1", None)
        .await
        .unwrap();

    // A stale snapshot id still lands on doc-a's live session.
    let joined = Coordinator::join_by_document_or_snapshot(
        &pool,
        "doc-a",
        Some(Uuid::now_v7()),
        "u2",
        None,
    )
    .await
    .unwrap();
    assert_eq!(joined.snapshot_id, u1.snapshot_id);
    assert_eq!(joined.document_version_id.as_deref(), Some("v1"));

    // The joiner's own session now shares the view.
    let resolved = Coordinator::resolve_snapshot(&pool, "u2").await.unwrap();
    assert_eq!(resolved, joined);

    // But a document with no sessions at all cannot be joined.
    let result =
        Coordinator::join_by_document_or_snapshot(&pool, "doc-x", None, "u3", None).await;
    assert_matches!(
        result,
        Err(SyncError::Core(CoreError::SnapshotJoinNotFound { .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reopening_never_leaves_two_sessions_for_one_user(pool: PgPool) {
    let first = Coordinator::open_session(&pool, Some("doc-a"), None, "u1", None)
        .await
        .unwrap();
    let second = Coordinator::open_session(&pool, Some("doc-b"), None, "u1", None)
        .await
        .unwrap();
    assert_ne!(first.snapshot_id, second.snapshot_id);

    let resolved = Coordinator::resolve_snapshot(&pool, "u1").await.unwrap();
    assert_eq!(resolved.document_id.as_deref(), Some("doc-b"));
    assert_eq!(resolved.snapshot_id, second.snapshot_id);
}

// ---------------------------------------------------------------------------
// Last-user detection and close
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sole_editor_flips_when_a_second_user_joins(pool: PgPool) {
    let u1 = Coordinator::open_session(&pool, Some("doc-a"), Some("v1"), "u1", None)
        .await
        .unwrap();
    let snapshot = u1.snapshot_id;

    assert!(
        Coordinator::is_sole_editor(&pool, "u1", "doc-a", Some("v1"), snapshot)
            .await
            .unwrap()
    );

    Coordinator::join_session(&pool, "doc-a", snapshot, "u2", None)
        .await
        .unwrap();

    assert!(
        !Coordinator::is_sole_editor(&pool, "u1", "doc-a", Some("v1"), snapshot)
            .await
            .unwrap()
    );
    assert!(
        !Coordinator::is_sole_editor(&pool, "u2", "doc-a", Some("v1"), snapshot)
            .await
            .unwrap()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sole_editor_is_false_for_a_user_who_is_not_editing(pool: PgPool) {
    let u1 = Coordinator::open_session(&pool, Some("doc-a"), None, "u1", None)
        .await
        .unwrap();

    // Logged as an inconsistency, but lenient: false, not an error.
    assert!(
        !Coordinator::is_sole_editor(&pool, "ghost", "doc-a", None, u1.snapshot_id)
            .await
            .unwrap()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn closing_reports_the_last_session_transition(pool: PgPool) {
    let u1 = Coordinator::open_session(&pool, Some("doc-a"), Some("v1"), "u1", None)
        .await
        .unwrap();
    Coordinator::join_session(&pool, "doc-a", u1.snapshot_id, "u2", None)
        .await
        .unwrap();

    let first = Coordinator::close_session(&pool, "u1").await.unwrap().unwrap();
    assert!(!first.was_last);

    let second = Coordinator::close_session(&pool, "u2").await.unwrap().unwrap();
    assert!(second.was_last);

    // Closing with no session degrades to None.
    assert!(Coordinator::close_session(&pool, "u1").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Soft-lock conflicts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn component_conflict_clears_when_the_holder_moves_away(pool: PgPool) {
    let u1 = Coordinator::open_session(&pool, Some("doc-a"), None, "u1", None)
        .await
        .unwrap();
    Coordinator::join_session(&pool, "doc-a", u1.snapshot_id, "u2", None)
        .await
        .unwrap();

    Coordinator::update_position(&pool, "u1", Some("p1"), Some("b1"), Some("c7"))
        .await
        .unwrap();

    assert!(
        !Coordinator::can_edit(&pool, "doc-a", Some("c7"), Some("b1"), "u2")
            .await
            .unwrap()
    );
    // A different component on the same block is free at component
    // granularity.
    assert!(
        Coordinator::can_edit(&pool, "doc-a", Some("c8"), Some("b1"), "u2")
            .await
            .unwrap()
    );
    // The holder does not conflict with themselves.
    assert!(
        Coordinator::can_edit(&pool, "doc-a", Some("c7"), Some("b1"), "u1")
            .await
            .unwrap()
    );

    // u1 navigates away; the component frees up.
    Coordinator::update_position(&pool, "u1", Some("p2"), None, None)
        .await
        .unwrap();
    assert!(
        Coordinator::can_edit(&pool, "doc-a", Some("c7"), Some("b1"), "u2")
            .await
            .unwrap()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn block_granularity_applies_when_no_component_is_targeted(pool: PgPool) {
    let u1 = Coordinator::open_session(&pool, Some("doc-a"), None, "u1", None)
        .await
        .unwrap();
    Coordinator::join_session(&pool, "doc-a", u1.snapshot_id, "u2", None)
        .await
        .unwrap();

    Coordinator::update_position(&pool, "u1", Some("p1"), Some("b1"), None)
        .await
        .unwrap();

    assert!(!Coordinator::can_edit(&pool, "doc-a", None, Some("b1"), "u2")
        .await
        .unwrap());
    assert!(Coordinator::can_edit(&pool, "doc-a", None, Some("b2"), "u2")
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn closing_the_holder_releases_the_conflict(pool: PgPool) {
    let u1 = Coordinator::open_session(&pool, Some("doc-a"), None, "u1", None)
        .await
        .unwrap();
    Coordinator::join_session(&pool, "doc-a", u1.snapshot_id, "u2", None)
        .await
        .unwrap();
    Coordinator::update_position(&pool, "u1", Some("p1"), Some("b1"), Some("c7"))
        .await
        .unwrap();

    Coordinator::close_session(&pool, "u1").await.unwrap();

    assert!(
        Coordinator::can_edit(&pool, "doc-a", Some("c7"), Some("b1"), "u2")
            .await
            .unwrap()
    );
}

// ---------------------------------------------------------------------------
// Save flag and polling surface
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn save_flag_round_trip(pool: PgPool) {
    let u1 = Coordinator::open_session(&pool, Some("doc-a"), None, "u1", None)
        .await
        .unwrap();
    let snapshot = u1.snapshot_id;

    assert!(!Coordinator::anyone_saving(&pool, Some("doc-a"), snapshot)
        .await
        .unwrap());

    Coordinator::mark_saving(&pool, "u1").await.unwrap();
    assert!(Coordinator::anyone_saving(&pool, Some("doc-a"), snapshot)
        .await
        .unwrap());

    Coordinator::clear_saving(&pool, "u1").await.unwrap();
    assert!(!Coordinator::anyone_saving(&pool, Some("doc-a"), snapshot)
        .await
        .unwrap());

    // An unsaved document has no identity to conflict on.
    assert!(!Coordinator::anyone_saving(&pool, None, snapshot).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn acknowledging_flags_lowers_them(pool: PgPool) {
    Coordinator::open_session(&pool, Some("doc-a"), None, "u1", None)
        .await
        .unwrap();
    Coordinator::update_position(&pool, "u1", Some("p1"), None, None)
        .await
        .unwrap();

    let acknowledged =
        Coordinator::acknowledge_flags(&pool, "u1", &[SyncFlag::NavChange]).await.unwrap();
    assert!(acknowledged);

    let session = Coordinator::resolve_snapshot(&pool, "u1").await;
    assert!(session.is_ok());
    assert!(!Coordinator::acknowledge_flags(&pool, "ghost", &[SyncFlag::NavChange])
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_session_paths_degrade_without_failing(pool: PgPool) {
    assert!(!Coordinator::update_position(&pool, "ghost", Some("p1"), None, None)
        .await
        .unwrap());
    assert!(!Coordinator::mark_saving(&pool, "ghost").await.unwrap());

    let resolved = Coordinator::resolve_snapshot(&pool, "ghost").await;
    assert_matches!(
        resolved,
        Err(SyncError::Core(CoreError::SessionNotFound { .. }))
    );
}

// ---------------------------------------------------------------------------
// Staleness reporting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_sessions_surface_through_the_configured_horizon(pool: PgPool) {
    Coordinator::open_session(&pool, Some("doc-a"), Some("v1"), "u1", None)
        .await
        .unwrap();
    Coordinator::open_session(&pool, Some("doc-a"), Some("v1"), "u2", None)
        .await
        .unwrap();

    let config = SyncConfig::default();
    let fresh = Coordinator::list_stale_sessions(&pool, &config).await.unwrap();
    assert!(fresh.is_empty());

    // Age one session well past the default 30-minute horizon.
    sqlx::query("UPDATE editing_sessions SET last_action = NOW() - interval '1 hour' WHERE user_id = $1")
        .bind("u1")
        .execute(&pool)
        .await
        .unwrap();

    let stale = Coordinator::list_stale_sessions(&pool, &config).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].user_id, "u1");
}

// ---------------------------------------------------------------------------
// Membership policy
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn owner_membership_is_protected(pool: PgPool) {
    let owner = Coordinator::ensure_membership(&pool, "doc-a", "u1", MembershipRole::Owner, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner.role, MembershipRole::Owner);

    // A second owner is refused, whether as a new row or a promotion.
    assert!(
        Coordinator::ensure_membership(&pool, "doc-a", "u2", MembershipRole::Owner, None)
            .await
            .unwrap()
            .is_none()
    );
    Coordinator::ensure_membership(&pool, "doc-a", "u3", MembershipRole::Viewer, None)
        .await
        .unwrap()
        .unwrap();
    assert!(
        Coordinator::ensure_membership(&pool, "doc-a", "u3", MembershipRole::Owner, None)
            .await
            .unwrap()
            .is_none()
    );

    // Demoting the owner is refused; the original row is preserved.
    assert!(
        Coordinator::ensure_membership(&pool, "doc-a", "u1", MembershipRole::Viewer, None)
            .await
            .unwrap()
            .is_none()
    );
    let members = Coordinator::list_members(&pool, "doc-a").await.unwrap();
    let u1 = members.iter().find(|m| m.user_id == "u1").unwrap();
    assert_eq!(u1.role, MembershipRole::Owner);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_owner_roles_can_move_freely(pool: PgPool) {
    Coordinator::ensure_membership(&pool, "doc-a", "u1", MembershipRole::Viewer, None)
        .await
        .unwrap()
        .unwrap();

    let promoted =
        Coordinator::ensure_membership(&pool, "doc-a", "u1", MembershipRole::Collaborator, None)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(promoted.role, MembershipRole::Collaborator);

    // Re-asserting the same role is an idempotent touch.
    let same =
        Coordinator::ensure_membership(&pool, "doc-a", "u1", MembershipRole::Collaborator, None)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(same.role, MembershipRole::Collaborator);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ensure_owner_prefers_the_historical_author(pool: PgPool) {
    let bootstrapped =
        Coordinator::ensure_owner(&pool, "doc-a", "u-current", Some("u-author"), None)
            .await
            .unwrap()
            .unwrap();
    assert_eq!(bootstrapped.user_id, "u-author");
    assert_eq!(bootstrapped.role, MembershipRole::Owner);

    // Memberships exist now, so a later call is a no-op.
    assert!(Coordinator::ensure_owner(&pool, "doc-a", "u-other", None, None)
        .await
        .unwrap()
        .is_none());

    // Without a historical author, the acting user becomes owner.
    let fallback = Coordinator::ensure_owner(&pool, "doc-b", "u-current", None, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fallback.user_id, "u-current");
}
