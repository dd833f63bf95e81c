use thiserror::Error;

/// Reasons a request fails authentication or authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    /// Malformed, expired or badly signed token.
    #[error("Invalid token")]
    InvalidToken,

    /// Token was valid but the identity is missing or inactive.
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    #[error("No token secret configured")]
    MissingSecret,
}

#[derive(Debug, Error)]
pub enum AccountsError {
    // Auth errors
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Invalid email or password")]
    InvalidCredentials,

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Record errors
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),

    // Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    // Storage errors
    #[error("Storage error: {0}")]
    StorageError(String),

    // System errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountsError {
    /// Message that is safe to hand back to an API caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Auth(AuthError::MissingSecret) => "Internal server error".to_string(),
            Self::Auth(e) => e.to_string(),
            Self::InvalidCredentials => self.to_string(),
            Self::NotFound(what) => format!("{} not found", what),
            Self::Conflict(msg) | Self::ValidationError(msg) => msg.clone(),
            Self::ConfigError(_) | Self::StorageError(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

// Generic result type for RustyAccounts
pub type Result<T> = std::result::Result<T, AccountsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_details_are_not_public() {
        let err = AccountsError::StorageError("lock poisoned at users table".to_string());
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.to_string().contains("lock poisoned"));
    }

    #[test]
    fn test_auth_error_converts() {
        let err: AccountsError = AuthError::Forbidden.into();
        assert!(matches!(err, AccountsError::Auth(AuthError::Forbidden)));
        assert_eq!(err.public_message(), "Forbidden: insufficient permissions");
    }

    #[test]
    fn test_not_found_message() {
        let err = AccountsError::NotFound("User".to_string());
        assert_eq!(err.public_message(), "User not found");
    }
}
