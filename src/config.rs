//! Server configuration module
//! Handles configuration parameters for the accounts server

use crate::constants::{
    DEFAULT_HOST, DEFAULT_PAGE_SIZE, DEFAULT_PORT, DEFAULT_TOKEN_TTL_HOURS, MAX_PAGE_SIZE,
    MAX_TOKEN_TTL_HOURS,
};
use crate::error::{AccountsError, Result};
use crate::security_logger::{log_event, SecurityEvent};
use std::env;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JWT secret for token signing/validation
    pub jwt_secret: String,
    /// Lifetime of issued tokens
    pub token_ttl_hours: u64,
    /// Page size used when a list request does not give one
    pub default_page_size: usize,
    /// Upper bound on requested page sizes
    pub max_page_size: usize,
    /// Bootstrap admin account, created at startup when absent
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Development mode (relaxes secret pattern checks)
    pub development_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        panic!("ServerConfig::default() is not allowed for security reasons. Use ServerConfig::from_env() instead.");
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_flag(value: Option<String>) -> bool {
    value
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false)
}

impl ServerConfig {
    /// Validate that a secret meets security requirements
    fn validate_secret(secret: &str, development_mode: bool) -> Result<()> {
        if secret.len() < 32 {
            return Err(AccountsError::ConfigError(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        // Ensure some complexity
        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AccountsError::ConfigError(
                "JWT secret should contain mixed characters (letters, numbers, symbols)".to_string(),
            ));
        }

        if development_mode {
            return Ok(());
        }

        // Check for placeholder values copied from docs
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "changeme",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.to_lowercase().contains(pattern) {
                return Err(AccountsError::ConfigError(format!(
                    "JWT secret contains insecure pattern '{}'. Please use a secure random secret generated with: openssl rand -base64 32",
                    pattern
                )));
            }
        }

        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let result = Self::build(&lookup);
        if let Err(ref e) = result {
            log_event(&SecurityEvent::ConfigurationError {
                component: "config".to_string(),
                error: e.to_string(),
            });
        }
        result
    }

    fn build<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("RUSTY_ACCOUNTS_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(lookup("RUSTY_ACCOUNTS_PORT"), DEFAULT_PORT);
        let development_mode = parse_flag(lookup("RUSTY_ACCOUNTS_DEVELOPMENT_MODE"));

        let jwt_secret = lookup("RUSTY_ACCOUNTS_JWT_SECRET")
            .or_else(|| lookup("JWT_SECRET"))
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                AccountsError::ConfigError(
                    "JWT_SECRET environment variable is required. \
                     Generate one with: openssl rand -base64 32"
                        .to_string(),
                )
            })?;
        Self::validate_secret(&jwt_secret, development_mode)?;

        let token_ttl_hours = parse_or(lookup("RUSTY_ACCOUNTS_TOKEN_TTL_HOURS"), DEFAULT_TOKEN_TTL_HOURS);
        if token_ttl_hours == 0 || token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(AccountsError::ConfigError(format!(
                "RUSTY_ACCOUNTS_TOKEN_TTL_HOURS must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            )));
        }

        let max_page_size = parse_or(lookup("RUSTY_ACCOUNTS_MAX_PAGE_SIZE"), MAX_PAGE_SIZE).max(1);
        let default_page_size = parse_or(lookup("RUSTY_ACCOUNTS_DEFAULT_PAGE_SIZE"), DEFAULT_PAGE_SIZE)
            .clamp(1, max_page_size);

        let admin_email = lookup("RUSTY_ACCOUNTS_ADMIN_EMAIL").filter(|v| !v.trim().is_empty());
        let admin_password = lookup("RUSTY_ACCOUNTS_ADMIN_PASSWORD").filter(|v| !v.is_empty());
        if admin_email.is_some() != admin_password.is_some() {
            return Err(AccountsError::ConfigError(
                "RUSTY_ACCOUNTS_ADMIN_EMAIL and RUSTY_ACCOUNTS_ADMIN_PASSWORD must be set together".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            jwt_secret,
            token_ttl_hours,
            default_page_size,
            max_page_size,
            admin_email,
            admin_password,
            development_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const GOOD_SECRET: &str = "q8Zr4mW1xT7vB2nK9pL5sD3fH6jG0cY!";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    #[should_panic(expected = "ServerConfig::default() is not allowed for security reasons")]
    fn test_default_panics() {
        let _ = ServerConfig::default();
    }

    #[test]
    fn test_defaults_apply() {
        let config = ServerConfig::from_lookup(lookup_from(&[("JWT_SECRET", GOOD_SECRET)])).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.token_ttl_hours, DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.max_page_size, MAX_PAGE_SIZE);
        assert!(config.admin_email.is_none());
        assert!(!config.development_mode);
    }

    #[test]
    fn test_prefixed_secret_wins() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("RUSTY_ACCOUNTS_JWT_SECRET", GOOD_SECRET),
            ("JWT_SECRET", "Zz9-another-value-that-is-long-enough"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_secret, GOOD_SECRET);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", GOOD_SECRET),
            ("RUSTY_ACCOUNTS_MAX_PAGE_SIZE", "20"),
            ("RUSTY_ACCOUNTS_DEFAULT_PAGE_SIZE", "50"),
        ]))
        .unwrap();
        assert_eq!(config.max_page_size, 20);
        assert_eq!(config.default_page_size, 20);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let result = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", GOOD_SECRET),
            ("RUSTY_ACCOUNTS_TOKEN_TTL_HOURS", "0"),
        ]));
        assert!(result.is_err());
    }
}
