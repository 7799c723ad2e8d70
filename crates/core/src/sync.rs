//! Sync-flag protocol constants, types, and position classification.
//!
//! This module lives in `core` (zero internal deps) so that the
//! repository layer and the synchronization coordinator reference the
//! same flag set and the same rules for which structural level a user
//! edit touches.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// Sessions whose `last_action` is older than this are candidates for
/// reaping by the external cleanup job. The core itself never deletes
/// stale sessions.
pub const SESSION_STALE_TIMEOUT_SECS: i64 = 1800;

/// Cadence at which UI clients re-fetch sync flags. The core does not
/// push; this is the documented polling contract.
pub const CLIENT_POLL_INTERVAL_MS: u64 = 3500;

// ---------------------------------------------------------------------------
// Sync flags
// ---------------------------------------------------------------------------

/// The fixed set of dirty flags a session can raise, one per structural
/// layer that changed and needs propagation to other clients.
///
/// Each variant maps to a dedicated boolean column on `editing_sessions`;
/// string-keyed flag maps are resolved to this enum at the API boundary
/// and never carried through the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFlag {
    /// The session is in the middle of persisting the document. Read by
    /// other clients as an advisory save lock.
    Save,
    /// The page tree changed (pages added, removed, moved, renamed).
    NavChange,
    /// The block layout of the current page changed.
    PageStructureChange,
    /// A component's content changed.
    ComponentsChange,
    /// A change that fits no specific layer; also clears the session's
    /// position fields.
    GenericUpdate,
}

impl SyncFlag {
    /// Column name backing this flag on `editing_sessions`.
    pub fn column(&self) -> &'static str {
        match self {
            SyncFlag::Save => "pending_save",
            SyncFlag::NavChange => "pending_nav_change",
            SyncFlag::PageStructureChange => "pending_page_structure_change",
            SyncFlag::ComponentsChange => "pending_components_change",
            SyncFlag::GenericUpdate => "pending_generic_update",
        }
    }
}

// ---------------------------------------------------------------------------
// Position classification
// ---------------------------------------------------------------------------

/// Given the position a client reports, decide which dirty flag the
/// update raises:
///
/// - a concrete component ⇒ [`SyncFlag::ComponentsChange`]
/// - a block without a specific component ⇒ [`SyncFlag::PageStructureChange`]
/// - a page alone (navigation) ⇒ [`SyncFlag::NavChange`]
/// - nothing at all ⇒ [`SyncFlag::GenericUpdate`]
pub fn classify_position(
    page_id: Option<&str>,
    block_id: Option<&str>,
    component_id: Option<&str>,
) -> SyncFlag {
    if component_id.is_some() {
        SyncFlag::ComponentsChange
    } else if block_id.is_some() {
        SyncFlag::PageStructureChange
    } else if page_id.is_some() {
        SyncFlag::NavChange
    } else {
        SyncFlag::GenericUpdate
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
