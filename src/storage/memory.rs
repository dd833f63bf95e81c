//! In-memory storage implementation for development and testing
//!
//! This provides a complete storage implementation that keeps all data
//! in memory. Suitable for development, testing, or small deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::*;
use crate::auth::role::{Permission, Role};
use crate::auth::user::User;
use crate::error::{AccountsError, Result};

/// Stored user, roles held by reference
#[derive(Debug, Clone)]
struct UserRecord {
    id: Uuid,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    password_hash: String,
    is_active: bool,
    is_verified: bool,
    role_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

/// Stored role, permissions held by reference
#[derive(Debug, Clone)]
struct RoleRecord {
    id: Uuid,
    name: String,
    priority: i32,
    is_active: bool,
    permission_ids: Vec<Uuid>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserRecord>,
    roles: HashMap<Uuid, RoleRecord>,
    permissions: HashMap<Uuid, Permission>,
}

impl MemoryState {
    fn resolve_role(&self, record: &RoleRecord) -> Role {
        Role {
            id: record.id,
            name: record.name.clone(),
            priority: record.priority,
            permissions: record
                .permission_ids
                .iter()
                .filter_map(|id| self.permissions.get(id).cloned())
                .collect(),
            is_active: record.is_active,
        }
    }

    fn resolve_user(&self, record: &UserRecord) -> User {
        User {
            id: record.id,
            email: record.email.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            password_hash: record.password_hash.clone(),
            is_active: record.is_active,
            is_verified: record.is_verified,
            roles: record
                .role_ids
                .iter()
                .filter_map(|id| self.roles.get(id))
                .map(|role| self.resolve_role(role))
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_login: record.last_login,
        }
    }

    fn email_taken_by_other(&self, email: &str, id: Uuid) -> bool {
        self.users.values().any(|u| u.email == email && u.id != id)
    }

    fn role_name_taken_by_other(&self, name: &str, id: Uuid) -> bool {
        self.roles.values().any(|r| r.name == name && r.id != id)
    }

    fn user_record(&self, user: &User) -> Result<UserRecord> {
        let mut role_ids: Vec<Uuid> = Vec::with_capacity(user.roles.len());
        for role in &user.roles {
            if !self.roles.contains_key(&role.id) {
                return Err(AccountsError::ValidationError(format!("Unknown role '{}'", role.name)));
            }
            if !role_ids.contains(&role.id) {
                role_ids.push(role.id);
            }
        }

        Ok(UserRecord {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password_hash: user.password_hash.clone(),
            is_active: user.is_active,
            is_verified: user.is_verified,
            role_ids,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login: user.last_login,
        })
    }

    fn role_record(&self, role: &Role) -> Result<RoleRecord> {
        let mut permission_ids: Vec<Uuid> = Vec::with_capacity(role.permissions.len());
        for permission in &role.permissions {
            if !self.permissions.contains_key(&permission.id) {
                return Err(AccountsError::ValidationError(format!(
                    "Unknown permission '{}'",
                    permission.name
                )));
            }
            if !permission_ids.contains(&permission.id) {
                permission_ids.push(permission.id);
            }
        }

        Ok(RoleRecord {
            id: role.id,
            name: role.name.clone(),
            priority: role.priority,
            is_active: role.is_active,
            permission_ids,
        })
    }
}

/// In-memory user, role and permission storage
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStorage for MemoryStorage {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|record| state.resolve_user(record)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|record| record.email == email)
            .map(|record| state.resolve_user(record)))
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;

        if state.users.contains_key(&user.id) {
            return Err(AccountsError::Conflict(format!("User {} already exists", user.id)));
        }
        if state.email_taken_by_other(&user.email, user.id) {
            return Err(AccountsError::Conflict("Email is already registered".to_string()));
        }

        let record = state.user_record(user)?;
        state.users.insert(user.id, record);
        Ok(())
    }

    async fn modify_user(&self, id: Uuid, edit: UserEdit) -> Result<User> {
        let mut state = self.state.write().await;

        let mut user = match state.users.get(&id) {
            Some(record) => state.resolve_user(record),
            None => return Err(AccountsError::NotFound("User".to_string())),
        };
        edit(&mut user)?;

        if user.id != id {
            return Err(AccountsError::Internal("User id cannot change".to_string()));
        }
        if state.email_taken_by_other(&user.email, id) {
            return Err(AccountsError::Conflict("Email is already registered".to_string()));
        }

        let record = state.user_record(&user)?;
        state.users.insert(id, record);
        Ok(user)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<User>> {
        let mut state = self.state.write().await;

        let record = match state.users.get_mut(&id) {
            Some(record) if record.is_active => {
                record.last_login = Some(at);
                record.clone()
            }
            _ => return Ok(None),
        };
        Ok(Some(state.resolve_user(&record)))
    }

    async fn list_users(&self, pagination: Pagination, include_inactive: bool) -> Result<Page<User>> {
        let state = self.state.read().await;

        let mut records: Vec<&UserRecord> = state
            .users
            .values()
            .filter(|record| include_inactive || record.is_active)
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = records.len();
        let items = records
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit)
            .map(|record| state.resolve_user(record))
            .collect();

        Ok(Page::new(items, total, pagination))
    }

    async fn deactivate_user(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;

        match state.users.get_mut(&id) {
            Some(record) => {
                record.is_active = false;
                record.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AccountsError::NotFound("User".to_string())),
        }
    }
}

#[async_trait]
impl RoleStorage for MemoryStorage {
    async fn find_role(&self, name: &str) -> Result<Option<Role>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .values()
            .find(|record| record.name == name)
            .map(|record| state.resolve_role(record)))
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state
            .roles
            .values()
            .map(|record| state.resolve_role(record))
            .collect();
        roles.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        Ok(roles)
    }

    async fn insert_role(&self, role: &Role) -> Result<()> {
        let mut state = self.state.write().await;

        if state.roles.contains_key(&role.id) || state.role_name_taken_by_other(&role.name, role.id) {
            return Err(AccountsError::Conflict(format!("Role '{}' already exists", role.name)));
        }

        let record = state.role_record(role)?;
        state.roles.insert(role.id, record);
        Ok(())
    }

    async fn update_role(&self, role: &Role) -> Result<()> {
        let mut state = self.state.write().await;

        if !state.roles.contains_key(&role.id) {
            return Err(AccountsError::NotFound("Role".to_string()));
        }
        if state.role_name_taken_by_other(&role.name, role.id) {
            return Err(AccountsError::Conflict(format!("Role '{}' already exists", role.name)));
        }

        let record = state.role_record(role)?;
        state.roles.insert(role.id, record);
        Ok(())
    }

    async fn find_permission(&self, name: &str) -> Result<Option<Permission>> {
        let state = self.state.read().await;
        Ok(state.permissions.values().find(|p| p.name == name).cloned())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>> {
        let state = self.state.read().await;
        let mut permissions: Vec<Permission> = state.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    async fn insert_permission(&self, permission: &Permission) -> Result<()> {
        let mut state = self.state.write().await;

        if state.permissions.contains_key(&permission.id)
            || state.permissions.values().any(|p| p.name == permission.name)
        {
            return Err(AccountsError::Conflict(format!(
                "Permission '{}' already exists",
                permission.name
            )));
        }

        state.permissions.insert(permission.id, permission.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage_with_role(name: &str, perms: &[&str]) -> (MemoryStorage, Role) {
        let storage = MemoryStorage::new();
        let mut role = Role::new(name, 10);
        for perm in perms {
            let permission = Permission::new(*perm, "");
            storage.insert_permission(&permission).await.unwrap();
            role.add_permission(permission);
        }
        storage.insert_role(&role).await.unwrap();
        (storage, role)
    }

    #[tokio::test]
    async fn test_user_round_trip_resolves_roles() {
        let (storage, role) = storage_with_role("moderator", &["users.read"]).await;
        let user = User::with_roles("mod@example.com".to_string(), "hash".to_string(), vec![role]);
        storage.insert_user(&user).await.unwrap();

        let found = storage.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.email, "mod@example.com");
        assert!(found.has_role("moderator"));
        assert!(found.has_permission("users.read"));

        assert!(storage.find_by_email("mod@example.com").await.unwrap().is_some());
        assert!(storage.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_role_changes_are_visible_to_users() {
        let (storage, mut role) = storage_with_role("moderator", &[]).await;
        let user = User::with_roles("mod@example.com".to_string(), String::new(), vec![role.clone()]);
        storage.insert_user(&user).await.unwrap();

        let permission = Permission::new("users.delete", "");
        storage.insert_permission(&permission).await.unwrap();
        role.add_permission(permission);
        storage.update_role(&role).await.unwrap();

        let found = storage.find_by_id(user.id).await.unwrap().unwrap();
        assert!(found.has_permission("users.delete"));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let storage = MemoryStorage::new();
        storage
            .insert_user(&User::new("a@example.com".to_string(), String::new()))
            .await
            .unwrap();

        let result = storage
            .insert_user(&User::new("a@example.com".to_string(), String::new()))
            .await;
        assert!(matches!(result, Err(AccountsError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_role_and_permission_names_conflict() {
        let (storage, _) = storage_with_role("admin", &["users.read"]).await;

        let role = storage.insert_role(&Role::new("admin", 1)).await;
        assert!(matches!(role, Err(AccountsError::Conflict(_))));

        let perm = storage.insert_permission(&Permission::new("users.read", "")).await;
        assert!(matches!(perm, Err(AccountsError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let storage = MemoryStorage::new();
        let user = User::with_roles("a@example.com".to_string(), String::new(), vec![Role::new("ghost", 1)]);

        let result = storage.insert_user(&user).await;
        assert!(matches!(result, Err(AccountsError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_modify_user_keeps_untouched_fields() {
        let (storage, role) = storage_with_role("moderator", &[]).await;
        let user = User::new("a@example.com".to_string(), String::new());
        storage.insert_user(&user).await.unwrap();

        storage.deactivate_user(user.id).await.unwrap();
        storage
            .modify_user(user.id, Box::new(move |u: &mut User| {
                u.roles = vec![role];
                Ok(())
            }))
            .await
            .unwrap();

        // An edit of the names alone keeps the earlier deactivation and roles
        let edited = storage
            .modify_user(user.id, Box::new(|u: &mut User| {
                u.first_name = Some("Ada".to_string());
                Ok(())
            }))
            .await
            .unwrap();
        assert!(!edited.is_active);
        assert!(edited.has_role("moderator"));

        let stored = storage.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.first_name.as_deref(), Some("Ada"));
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_modify_user_errors() {
        let storage = MemoryStorage::new();
        let a = User::new("a@example.com".to_string(), String::new());
        let b = User::new("b@example.com".to_string(), String::new());
        storage.insert_user(&a).await.unwrap();
        storage.insert_user(&b).await.unwrap();

        let taken = storage
            .modify_user(b.id, Box::new(|u: &mut User| {
                u.email = "a@example.com".to_string();
                Ok(())
            }))
            .await;
        assert!(matches!(taken, Err(AccountsError::Conflict(_))));

        let missing = storage.modify_user(Uuid::new_v4(), Box::new(|_: &mut User| Ok(()))).await;
        assert!(matches!(missing, Err(AccountsError::NotFound(_))));

        // A failing edit writes nothing
        let failed = storage
            .modify_user(a.id, Box::new(|u: &mut User| {
                u.is_active = false;
                Err(AccountsError::ValidationError("no".to_string()))
            }))
            .await;
        assert!(failed.is_err());
        assert!(storage.find_by_id(a.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_record_login_skips_inactive_users() {
        let storage = MemoryStorage::new();
        let user = User::new("a@example.com".to_string(), String::new());
        storage.insert_user(&user).await.unwrap();

        let at = Utc::now();
        let logged_in = storage.record_login(user.id, at).await.unwrap().unwrap();
        assert_eq!(logged_in.last_login, Some(at));

        storage.deactivate_user(user.id).await.unwrap();
        assert!(storage.record_login(user.id, Utc::now()).await.unwrap().is_none());
        assert!(storage.record_login(Uuid::new_v4(), Utc::now()).await.unwrap().is_none());

        let stored = storage.find_by_id(user.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.last_login, Some(at));
    }

    #[tokio::test]
    async fn test_deactivate_keeps_roles() {
        let (storage, role) = storage_with_role("admin", &["users.read"]).await;
        let user = User::with_roles("a@example.com".to_string(), String::new(), vec![role]);
        storage.insert_user(&user).await.unwrap();

        storage.deactivate_user(user.id).await.unwrap();

        let found = storage.find_by_id(user.id).await.unwrap().unwrap();
        assert!(!found.is_active);
        assert!(storage.find_role("admin").await.unwrap().is_some());

        let missing = storage.deactivate_user(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(AccountsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_users_pages_and_filters() {
        let storage = MemoryStorage::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let mut user = User::new(format!("user{}@example.com", i), String::new());
            user.created_at = Utc::now() + chrono::Duration::seconds(i);
            storage.insert_user(&user).await.unwrap();
            ids.push(user.id);
        }
        storage.deactivate_user(ids[0]).await.unwrap();

        let page = storage.list_users(Pagination::new(1, 2), false).await.unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items[0].id, ids[1]);

        let page = storage.list_users(Pagination::new(3, 2), true).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, ids[4]);
    }
}
