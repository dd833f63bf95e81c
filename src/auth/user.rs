use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::auth::role::Role;

/// Represents a user account, the identity behind a token
#[derive(Debug, Clone)]
pub struct User {
    /// Unique, stable user identifier
    pub id: Uuid,
    /// Unique email address (stored lower-cased)
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Argon2 PHC string
    pub password_hash: String,
    /// False once the account has been soft deleted
    pub is_active: bool,
    /// Email verification flag
    pub is_verified: bool,
    /// Attached roles, as resolved at lookup time
    pub roles: Vec<Role>,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Creates an active, unverified user without roles
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            first_name: None,
            last_name: None,
            password_hash,
            is_active: true,
            is_verified: false,
            roles: Vec::new(),
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    /// Creates a user with roles attached
    pub fn with_roles(email: String, password_hash: String, roles: Vec<Role>) -> Self {
        let mut user = Self::new(email, password_hash);
        user.roles = roles;
        user
    }

    /// True iff an attached role is named exactly `name` (case-sensitive)
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    /// True iff an active attached role grants a permission named exactly `name`
    pub fn has_permission(&self, name: &str) -> bool {
        self.roles
            .iter()
            .filter(|role| role.is_active)
            .any(|role| role.has_permission(name))
    }

    /// Union of permission names across all active roles
    pub fn effective_permissions(&self) -> BTreeSet<&str> {
        self.roles
            .iter()
            .filter(|role| role.is_active)
            .flat_map(|role| role.permissions.iter().map(|p| p.name.as_str()))
            .collect()
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|role| role.name.clone()).collect()
    }

    /// The most privileged attached role, if any
    pub fn primary_role(&self) -> Option<&Role> {
        self.roles.iter().max_by_key(|role| role.priority)
    }

    /// Update modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::role::Permission;

    fn role_with(name: &str, priority: i32, perms: &[&str]) -> Role {
        let mut role = Role::new(name, priority);
        for perm in perms {
            role.add_permission(Permission::new(*perm, ""));
        }
        role
    }

    #[test]
    fn test_primary_role_is_highest_priority() {
        let user = User::with_roles(
            "a@example.com".to_string(),
            String::new(),
            vec![role_with("user", 1, &[]), role_with("admin", 100, &[]), role_with("moderator", 50, &[])],
        );
        assert_eq!(user.primary_role().map(|r| r.name.as_str()), Some("admin"));
    }

    #[test]
    fn test_inactive_role_grants_nothing() {
        let mut moderator = role_with("moderator", 50, &["users.read"]);
        moderator.is_active = false;
        let user = User::with_roles("a@example.com".to_string(), String::new(), vec![moderator]);

        assert!(!user.has_permission("users.read"));
        assert!(user.effective_permissions().is_empty());
    }

    #[test]
    fn test_effective_permissions_is_a_union() {
        let user = User::with_roles(
            "a@example.com".to_string(),
            String::new(),
            vec![
                role_with("moderator", 50, &["users.read", "users.write"]),
                role_with("auditor", 20, &["users.read", "audit.read"]),
            ],
        );
        let perms: Vec<&str> = user.effective_permissions().into_iter().collect();
        assert_eq!(perms, vec!["audit.read", "users.read", "users.write"]);
    }
}
