use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named capability that can be granted through a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Unique permission identifier
    pub id: Uuid,
    /// Globally unique name, e.g. "users.read"
    pub name: String,
    /// Human readable description
    pub description: String,
}

impl Permission {
    /// Creates a new permission with a fresh id
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A named bundle of permissions assignable to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role identifier
    pub id: Uuid,
    /// Globally unique name, e.g. "admin"
    pub name: String,
    /// Higher means more privileged
    pub priority: i32,
    /// Permissions granted by this role (unordered)
    pub permissions: Vec<Permission>,
    /// Inactive roles grant no permissions
    pub is_active: bool,
}

impl Role {
    /// Creates an active role without permissions
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            priority,
            permissions: Vec::new(),
            is_active: true,
        }
    }

    /// Grants a permission. Returns false if a permission with the same id
    /// was already present.
    pub fn add_permission(&mut self, permission: Permission) -> bool {
        if self.permissions.iter().any(|p| p.id == permission.id) {
            return false;
        }
        self.permissions.push(permission);
        true
    }

    /// Revokes a permission by id. Returns false if it was not granted.
    pub fn remove_permission(&mut self, permission_id: Uuid) -> bool {
        let before = self.permissions.len();
        self.permissions.retain(|p| p.id != permission_id);
        self.permissions.len() != before
    }

    /// Check if this role grants a permission by exact name
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.iter().any(|p| p.name == name)
    }

    pub fn permission_names(&self) -> Vec<String> {
        self.permissions.iter().map(|p| p.name.clone()).collect()
    }
}
