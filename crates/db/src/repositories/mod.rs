//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Every tree query takes
//! the snapshot id as a mandatory parameter; none infers it from the
//! document id alone.

pub mod component_repo;
pub mod editing_session_repo;
pub mod membership_repo;
pub mod nav_node_repo;
pub mod page_block_repo;
pub mod tree_repo;

pub use component_repo::ComponentRepo;
pub use editing_session_repo::EditingSessionRepo;
pub use membership_repo::MembershipRepo;
pub use nav_node_repo::NavNodeRepo;
pub use page_block_repo::PageBlockRepo;
pub use tree_repo::{DeletedCounts, TreeRepo};
