//! Application state wiring: stores, token manager, services

use std::sync::Arc;

use crate::auth::authenticator::Authenticator;
use crate::auth::token::TokenManager;
use crate::config::ServerConfig;
use crate::core::account_service::AccountService;
use crate::core::seed::{bootstrap_admin, seed_defaults};
use crate::error::{AccountsError, Result};
use crate::storage::{MemoryStorage, SharedRoleStorage, SharedUserStorage};

/// Everything a request handler needs, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    /// Build state over fresh in-memory storage
    pub async fn bootstrap(config: &ServerConfig) -> Result<Self> {
        Self::with_storage(config, MemoryStorage::new()).await
    }

    /// Build state over the given storage, seeding built-in roles and the
    /// configured admin account
    pub async fn with_storage(config: &ServerConfig, storage: MemoryStorage) -> Result<Self> {
        let tokens = Arc::new(
            TokenManager::new(&config.jwt_secret, config.token_ttl_hours)
                .map_err(|e| AccountsError::ConfigError(e.to_string()))?,
        );

        seed_defaults(&storage).await?;
        if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
            bootstrap_admin(&storage, &storage, email, password).await?;
        }

        let storage = Arc::new(storage);
        let users: SharedUserStorage = storage.clone();
        let roles: SharedRoleStorage = storage;

        let accounts = AccountService::new(users.clone(), roles, tokens.clone())
            .with_page_sizes(config.default_page_size, config.max_page_size);
        let authenticator = Authenticator::new(tokens, users);

        Ok(Self {
            accounts: Arc::new(accounts),
            authenticator: Arc::new(authenticator),
        })
    }
}
