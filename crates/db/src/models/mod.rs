//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts

pub mod component;
pub mod editing_session;
pub mod membership;
pub mod nav_node;
pub mod page_block;
