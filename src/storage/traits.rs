//! Abstract storage interfaces for pluggable backends
//!
//! Users reference roles and roles reference permissions; a backend stores
//! the references and resolves them to current records on every read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::role::{Permission, Role};
use crate::auth::user::User;
use crate::error::Result;

/// Page request, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Saturates, so an absurd page number yields an empty page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: total.div_ceil(pagination.limit),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// In-place change to a user, run while the store holds its write lock
pub type UserEdit = Box<dyn FnOnce(&mut User) -> Result<()> + Send>;

/// User account storage interface
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Look up a user by id, roles resolved. `Ok(None)` when absent.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Look up a user by (already normalized) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Store a new user. Fails with `Conflict` on a duplicate email and
    /// `ValidationError` if an attached role does not exist.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Apply `edit` to the stored user under the store's write lock and
    /// persist the result. Fields the edit does not touch keep their current
    /// stored values. `NotFound` when absent, `Conflict` on a taken email.
    async fn modify_user(&self, id: Uuid, edit: UserEdit) -> Result<User>;

    /// Set `last_login` on an active user. `Ok(None)` when the user is
    /// absent or inactive; nothing else is written.
    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<User>>;

    /// List users ordered by creation time
    async fn list_users(&self, pagination: Pagination, include_inactive: bool) -> Result<Page<User>>;

    /// Soft delete: clears the active flag, leaves roles untouched
    async fn deactivate_user(&self, id: Uuid) -> Result<()>;
}

/// Role and permission storage interface
#[async_trait]
pub trait RoleStorage: Send + Sync {
    async fn find_role(&self, name: &str) -> Result<Option<Role>>;

    /// All roles, highest priority first
    async fn list_roles(&self) -> Result<Vec<Role>>;

    /// Store a new role. Fails with `Conflict` on a duplicate name.
    async fn insert_role(&self, role: &Role) -> Result<()>;

    /// Replace a stored role, including its permission references
    async fn update_role(&self, role: &Role) -> Result<()>;

    async fn find_permission(&self, name: &str) -> Result<Option<Permission>>;

    /// All permissions ordered by name
    async fn list_permissions(&self) -> Result<Vec<Permission>>;

    /// Store a new permission. Fails with `Conflict` on a duplicate name.
    async fn insert_permission(&self, permission: &Permission) -> Result<()>;
}

pub type SharedUserStorage = Arc<dyn UserStorage>;
pub type SharedRoleStorage = Arc<dyn RoleStorage>;
