//! Synchronization coordinator for collaborative document editing.
//!
//! Sits between the HTTP layer (out of scope) and the repositories in
//! `coedit-db`, answering the questions the editing UI polls for:
//!
//! - [`Coordinator`] — session lifecycle (open/join/close), position
//!   updates, the advisory soft-lock check (`can_edit`), last-user
//!   detection, membership policy, and snapshot resolution for exporters.
//! - [`SyncError`] — typed results for conditions that are normal
//!   outcomes of concurrent multi-user editing.
//! - [`SyncConfig`] — env-driven tunables for the polling protocol.

pub mod config;
pub mod coordinator;
pub mod error;

pub use config::SyncConfig;
pub use coordinator::{ClosedSession, Coordinator, SnapshotRef};
pub use error::{SyncError, SyncResult};
