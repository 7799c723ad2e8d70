//! Pure domain layer for the coedit collaboration core.
//!
//! Zero internal dependencies so that the repository layer, the
//! synchronization coordinator, and any future tooling can all share the
//! same types, error taxonomy, and sync-flag protocol.

pub mod error;
pub mod roles;
pub mod sync;
pub mod types;
