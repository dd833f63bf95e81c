//! Account operations behind the HTTP handlers
//!
//! The service is constructed once with its stores and token manager and
//! shared by reference; it holds no per-request state.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_dummy_password, verify_password};
use crate::auth::role::{Permission, Role};
use crate::auth::token::TokenManager;
use crate::auth::user::User;
use crate::constants::{
    DEFAULT_PAGE_SIZE, LOGIN_FAILURE_FLOOR_MS, MAX_PAGE_SIZE, PERM_ROLES_MANAGE, USER_ROLE,
};
use crate::core::dto::*;
use crate::core::validation::{
    normalize_email, normalize_name, validate_identifier, validate_password,
};
use crate::error::{AccountsError, AuthError, Result};
use crate::security::AuthTimer;
use crate::security_logger::{log_event, SecurityEvent};
use crate::storage::{Page, Pagination, SharedRoleStorage, SharedUserStorage, UserEdit};

pub struct AccountService {
    users: SharedUserStorage,
    roles: SharedRoleStorage,
    tokens: Arc<TokenManager>,
    default_page_size: usize,
    max_page_size: usize,
}

impl AccountService {
    pub fn new(users: SharedUserStorage, roles: SharedRoleStorage, tokens: Arc<TokenManager>) -> Self {
        Self {
            users,
            roles,
            tokens,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    /// Override list page sizes
    pub fn with_page_sizes(mut self, default_page_size: usize, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.max(1);
        self.default_page_size = default_page_size.clamp(1, self.max_page_size);
        self
    }

    async fn roles_by_name(&self, names: &[String]) -> Result<Vec<Role>> {
        let mut roles: Vec<Role> = Vec::with_capacity(names.len());
        for name in names {
            if roles.iter().any(|r| &r.name == name) {
                continue;
            }
            let role = self
                .roles
                .find_role(name)
                .await?
                .ok_or_else(|| AccountsError::ValidationError(format!("Unknown role '{}'", name)))?;
            roles.push(role);
        }
        Ok(roles)
    }

    async fn default_roles(&self) -> Result<Vec<Role>> {
        match self.roles.find_role(USER_ROLE).await? {
            Some(role) => Ok(vec![role]),
            None => Err(AccountsError::Internal(format!(
                "Default role '{}' has not been seeded",
                USER_ROLE
            ))),
        }
    }

    async fn existing_user(&self, id: Uuid) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountsError::NotFound("User".to_string()))
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> Result<()> {
        match self.users.find_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => {
                Err(AccountsError::Conflict("Email is already registered".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn auth_response(&self, user: &User) -> Result<AuthResponse> {
        Ok(AuthResponse {
            token: self.tokens.issue_for(user)?,
            user: UserProfile::from(user),
        })
    }

    // ----- self service -----

    /// Register a new account with the default role and return a token
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        let email = normalize_email(&request.email)?;
        validate_password(&request.password)?;
        let first_name = normalize_name(request.first_name.as_deref(), "first name")?;
        let last_name = normalize_name(request.last_name.as_deref(), "last name")?;

        self.ensure_email_free(&email, None).await?;

        let mut user = User::with_roles(email, hash_password(&request.password)?, self.default_roles().await?);
        user.first_name = first_name;
        user.last_name = last_name;
        self.users.insert_user(&user).await?;

        log::info!("Registered user {}", user.id);
        self.auth_response(&user)
    }

    /// Exchange email and password for a token
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let timer = AuthTimer::start(Duration::from_millis(LOGIN_FAILURE_FLOOR_MS));
        let email = request.email.trim().to_lowercase();

        // Every path pays for one argon2 verification
        let verified = match self.users.find_by_email(&email).await? {
            Some(user) if verify_password(&request.password, &user.password_hash) => Some(user),
            Some(_) => None,
            None => {
                verify_dummy_password(&request.password);
                None
            }
        };

        // Sets last_login only, and only while the account is still active
        let logged_in = match verified {
            Some(user) => self.users.record_login(user.id, chrono::Utc::now()).await?,
            None => None,
        };

        let Some(user) = logged_in else {
            log_event(&SecurityEvent::LoginFailed { email });
            timer.wait().await;
            return Err(AccountsError::InvalidCredentials);
        };

        log::info!("User {} logged in", user.id);
        self.auth_response(&user)
    }

    pub fn profile(&self, user: &User) -> UserProfile {
        UserProfile::from(user)
    }

    /// Update the caller's own names, email or password
    pub async fn update_profile(&self, user: &User, request: UpdateProfileRequest) -> Result<UserProfile> {
        let first_name = optional_name(request.first_name.as_deref(), "first name")?;
        let last_name = optional_name(request.last_name.as_deref(), "last name")?;
        let email = request.email.as_deref().map(normalize_email).transpose()?;
        if let Some(email) = &email {
            self.ensure_email_free(email, Some(user.id)).await?;
        }
        let password_hash = match request.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let edit: UserEdit = Box::new(move |user: &mut User| {
            if let Some(first_name) = first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                user.last_name = last_name;
            }
            if let Some(email) = email {
                user.email = email;
            }
            if let Some(password_hash) = password_hash {
                user.password_hash = password_hash;
            }
            user.touch();
            Ok(())
        });

        let user = self.users.modify_user(user.id, edit).await?;
        Ok(UserProfile::from(&user))
    }

    // ----- user administration -----

    pub async fn list_users(&self, query: PageQuery) -> Result<Page<UserProfile>> {
        let limit = query
            .limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);
        let pagination = Pagination::new(query.page.unwrap_or(1), limit);

        let page = self.users.list_users(pagination, query.include_inactive).await?;
        Ok(page.map(|user| UserProfile::from(&user)))
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserProfile> {
        let user = self.existing_user(id).await?;
        Ok(UserProfile::from(&user))
    }

    /// Create an account. `actor` may only hand out roles it could manage.
    pub async fn create_user(&self, actor: &User, request: CreateUserRequest) -> Result<UserProfile> {
        let email = normalize_email(&request.email)?;
        validate_password(&request.password)?;
        let first_name = normalize_name(request.first_name.as_deref(), "first name")?;
        let last_name = normalize_name(request.last_name.as_deref(), "last name")?;

        let roles = match request.roles.as_deref() {
            Some([]) => {
                return Err(AccountsError::ValidationError(
                    "A user needs at least one role".to_string(),
                ))
            }
            Some(names) => self.roles_by_name(names).await?,
            None => self.default_roles().await?,
        };
        ensure_within_ceiling(actor, &roles)?;

        self.ensure_email_free(&email, None).await?;

        let mut user = User::with_roles(email, hash_password(&request.password)?, roles);
        user.first_name = first_name;
        user.last_name = last_name;
        user.is_verified = request.is_verified.unwrap_or(false);
        self.users.insert_user(&user).await?;

        log::info!("Created user {} with roles {:?}", user.id, user.role_names());
        Ok(UserProfile::from(&user))
    }

    /// Update an account. Changing roles requires that both the current and
    /// the new roles are within `actor`'s reach.
    pub async fn update_user(
        &self,
        actor: &User,
        id: Uuid,
        request: AdminUpdateUserRequest,
    ) -> Result<UserProfile> {
        let first_name = optional_name(request.first_name.as_deref(), "first name")?;
        let last_name = optional_name(request.last_name.as_deref(), "last name")?;
        let email = request.email.as_deref().map(normalize_email).transpose()?;
        if let Some(email) = &email {
            self.ensure_email_free(email, Some(id)).await?;
        }
        let roles = match request.roles.as_deref() {
            Some([]) => {
                return Err(AccountsError::ValidationError(
                    "A user needs at least one role".to_string(),
                ))
            }
            Some(names) => {
                let roles = self.roles_by_name(names).await?;
                ensure_within_ceiling(actor, &roles)?;
                Some(roles)
            }
            None => None,
        };

        let ceiling = role_ceiling(actor);
        let edit: UserEdit = Box::new(move |user: &mut User| {
            if let Some(first_name) = first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                user.last_name = last_name;
            }
            if let Some(email) = email {
                user.email = email;
            }
            if let Some(roles) = roles {
                if exceeds(ceiling, &user.roles) {
                    return Err(AuthError::Forbidden.into());
                }
                user.roles = roles;
            }
            if let Some(is_active) = request.is_active {
                user.is_active = is_active;
            }
            if let Some(is_verified) = request.is_verified {
                user.is_verified = is_verified;
            }
            user.touch();
            Ok(())
        });

        let user = self.users.modify_user(id, edit).await?;
        log::info!("Updated user {} with roles {:?}", user.id, user.role_names());
        Ok(UserProfile::from(&user))
    }

    /// Soft delete; the account's roles are left untouched
    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        self.users.deactivate_user(id).await?;
        log::info!("Deactivated user {}", id);
        Ok(())
    }

    // ----- role administration -----

    pub async fn list_roles(&self) -> Result<Vec<RoleView>> {
        let roles = self.roles.list_roles().await?;
        Ok(roles.iter().map(RoleView::from).collect())
    }

    pub async fn create_role(&self, request: CreateRoleRequest) -> Result<RoleView> {
        let name = request.name.trim();
        validate_identifier(name, "role")?;

        let mut role = Role::new(name, request.priority.unwrap_or(0));
        for permission_name in request.permissions.unwrap_or_default() {
            let permission = self.existing_permission(&permission_name).await?;
            role.add_permission(permission);
        }

        self.roles.insert_role(&role).await?;
        log::info!("Created role '{}'", role.name);
        Ok(RoleView::from(&role))
    }

    pub async fn list_permissions(&self) -> Result<Vec<PermissionView>> {
        let permissions = self.roles.list_permissions().await?;
        Ok(permissions.iter().map(PermissionView::from).collect())
    }

    pub async fn create_permission(&self, request: CreatePermissionRequest) -> Result<PermissionView> {
        let name = request.name.trim();
        validate_identifier(name, "permission")?;

        let permission = Permission::new(name, request.description.unwrap_or_default().trim());
        self.roles.insert_permission(&permission).await?;
        log::info!("Created permission '{}'", permission.name);
        Ok(PermissionView::from(&permission))
    }

    async fn existing_role(&self, name: &str) -> Result<Role> {
        self.roles
            .find_role(name)
            .await?
            .ok_or_else(|| AccountsError::NotFound("Role".to_string()))
    }

    async fn existing_permission(&self, name: &str) -> Result<Permission> {
        self.roles
            .find_permission(name)
            .await?
            .ok_or_else(|| AccountsError::NotFound("Permission".to_string()))
    }

    /// Grant a permission to a role. Granting twice is a no-op.
    pub async fn grant_permission(&self, role_name: &str, permission_name: &str) -> Result<RoleView> {
        let mut role = self.existing_role(role_name).await?;
        let permission = self.existing_permission(permission_name).await?;

        if role.add_permission(permission) {
            self.roles.update_role(&role).await?;
            log::info!("Granted '{}' to role '{}'", permission_name, role_name);
        }
        Ok(RoleView::from(&role))
    }

    /// Revoke a permission from a role. Revoking an absent grant is a no-op.
    pub async fn revoke_permission(&self, role_name: &str, permission_name: &str) -> Result<RoleView> {
        let mut role = self.existing_role(role_name).await?;
        let permission = self.existing_permission(permission_name).await?;

        if role.remove_permission(permission.id) {
            self.roles.update_role(&role).await?;
            log::info!("Revoked '{}' from role '{}'", permission_name, role_name);
        }
        Ok(RoleView::from(&role))
    }
}

/// Validate an optional name update: `None` leaves the field alone,
/// `Some(None)` clears it
fn optional_name(name: Option<&str>, field: &str) -> Result<Option<Option<String>>> {
    name.map(|name| normalize_name(Some(name), field)).transpose()
}

/// Highest role priority `actor` may hand out; `None` means unlimited
fn role_ceiling(actor: &User) -> Option<i32> {
    if actor.has_permission(PERM_ROLES_MANAGE) {
        return None;
    }
    Some(actor.primary_role().map_or(i32::MIN, |role| role.priority))
}

fn exceeds(ceiling: Option<i32>, roles: &[Role]) -> bool {
    ceiling.is_some_and(|ceiling| roles.iter().any(|role| role.priority > ceiling))
}

fn ensure_within_ceiling(actor: &User, roles: &[Role]) -> Result<()> {
    if exceeds(role_ceiling(actor), roles) {
        log_event(&SecurityEvent::PermissionDenied {
            user_id: actor.id,
            requirement: "role assignment within own priority".to_string(),
        });
        return Err(AuthError::Forbidden.into());
    }
    Ok(())
}
