//! Built-in roles and permissions, and the bootstrap admin account

use crate::auth::password::hash_password;
use crate::auth::role::{Permission, Role};
use crate::auth::user::User;
use crate::constants::*;
use crate::core::validation::{normalize_email, validate_password};
use crate::error::{AccountsError, Result};
use crate::storage::{RoleStorage, UserStorage};

const DEFAULT_PERMISSIONS: [(&str, &str); 4] = [
    (PERM_USERS_READ, "View user accounts"),
    (PERM_USERS_WRITE, "Create and update user accounts"),
    (PERM_USERS_DELETE, "Deactivate user accounts"),
    (PERM_ROLES_MANAGE, "Manage roles and permissions"),
];

const DEFAULT_ROLES: [(&str, i32, &[&str]); 3] = [
    (
        ADMIN_ROLE,
        100,
        &[PERM_USERS_READ, PERM_USERS_WRITE, PERM_USERS_DELETE, PERM_ROLES_MANAGE],
    ),
    (MODERATOR_ROLE, 50, &[PERM_USERS_READ, PERM_USERS_WRITE]),
    (USER_ROLE, 1, &[]),
];

/// Create the built-in permissions and roles that are missing.
/// Existing records are left as they are.
pub async fn seed_defaults(roles: &dyn RoleStorage) -> Result<()> {
    for (name, description) in DEFAULT_PERMISSIONS {
        if roles.find_permission(name).await?.is_none() {
            roles.insert_permission(&Permission::new(name, description)).await?;
            log::debug!("Seeded permission '{}'", name);
        }
    }

    for (name, priority, permission_names) in DEFAULT_ROLES {
        if roles.find_role(name).await?.is_some() {
            continue;
        }

        let mut role = Role::new(name, priority);
        for permission_name in permission_names {
            let permission = roles.find_permission(permission_name).await?.ok_or_else(|| {
                AccountsError::Internal(format!("Permission '{}' missing while seeding", permission_name))
            })?;
            role.add_permission(permission);
        }
        roles.insert_role(&role).await?;
        log::debug!("Seeded role '{}'", name);
    }

    Ok(())
}

/// Create the configured admin account if no account uses that email.
/// Returns true when an account was created.
pub async fn bootstrap_admin(
    users: &dyn UserStorage,
    roles: &dyn RoleStorage,
    email: &str,
    password: &str,
) -> Result<bool> {
    let email = normalize_email(email)?;
    validate_password(password)?;

    if users.find_by_email(&email).await?.is_some() {
        log::debug!("Bootstrap admin {} already exists", email);
        return Ok(false);
    }

    let admin = roles
        .find_role(ADMIN_ROLE)
        .await?
        .ok_or_else(|| AccountsError::Internal(format!("Role '{}' has not been seeded", ADMIN_ROLE)))?;

    let mut user = User::with_roles(email, hash_password(password)?, vec![admin]);
    user.is_verified = true;
    users.insert_user(&user).await?;

    log::info!("Created bootstrap admin account {}", user.email);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let storage = MemoryStorage::new();
        seed_defaults(&storage).await.unwrap();
        seed_defaults(&storage).await.unwrap();

        assert_eq!(storage.list_roles().await.unwrap().len(), 3);
        assert_eq!(storage.list_permissions().await.unwrap().len(), 4);

        let admin = storage.find_role(ADMIN_ROLE).await.unwrap().unwrap();
        assert!(admin.has_permission(PERM_ROLES_MANAGE));
        let moderator = storage.find_role(MODERATOR_ROLE).await.unwrap().unwrap();
        assert!(!moderator.has_permission(PERM_USERS_DELETE));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_once() {
        let storage = MemoryStorage::new();
        seed_defaults(&storage).await.unwrap();

        assert!(bootstrap_admin(&storage, &storage, "Root@Example.com", "bootstrap-pass").await.unwrap());
        assert!(!bootstrap_admin(&storage, &storage, "root@example.com", "bootstrap-pass").await.unwrap());

        let admin = storage.find_by_email("root@example.com").await.unwrap().unwrap();
        assert!(admin.has_role(ADMIN_ROLE));
        assert!(admin.is_verified);
    }
}
