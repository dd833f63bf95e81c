//! Storage for user accounts, roles and permissions

pub mod memory;
pub mod traits;

// Re-export main components
pub use memory::MemoryStorage;
pub use traits::{Page, Pagination, RoleStorage, SharedRoleStorage, SharedUserStorage, UserEdit, UserStorage};
