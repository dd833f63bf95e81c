//! Request and response payloads for the accounts API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::role::{Permission, Role};
use crate::auth::user::User;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Fields a user may change on their own account
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Admin account creation
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Role names; defaults to the "user" role
    pub roles: Option<Vec<String>>,
    pub is_verified: Option<bool>,
}

/// Admin account update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Replaces the full role set when present
    pub roles: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

/// Query string for list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub priority: Option<i32>,
    /// Permission names granted at creation
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub roles: Vec<String>,
    /// Highest priority role, if any
    pub primary_role: Option<String>,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: user.is_active,
            is_verified: user.is_verified,
            roles: user.role_names(),
            primary_role: user.primary_role().map(|role| role.name.clone()),
            permissions: user
                .effective_permissions()
                .into_iter()
                .map(str::to_string)
                .collect(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleView {
    pub id: Uuid,
    pub name: String,
    pub priority: i32,
    pub is_active: bool,
    pub permissions: Vec<String>,
}

impl From<&Role> for RoleView {
    fn from(role: &Role) -> Self {
        let mut permissions = role.permission_names();
        permissions.sort();
        Self {
            id: role.id,
            name: role.name.clone(),
            priority: role.priority,
            is_active: role.is_active,
            permissions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

impl From<&Permission> for PermissionView {
    fn from(permission: &Permission) -> Self {
        Self {
            id: permission.id,
            name: permission.name.clone(),
            description: permission.description.clone(),
        }
    }
}
