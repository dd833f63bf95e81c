//! Request authentication pipeline
//!
//! Bearer header -> token verification -> identity lookup -> gate.

use std::sync::Arc;

use crate::auth::gate::{authorize, Decision, Denial, Requirement};
use crate::auth::token::{extract_bearer_token, Claims, TokenManager};
use crate::auth::user::User;
use crate::error::AuthError;
use crate::security_logger::{log_event, SecurityEvent};
use crate::storage::SharedUserStorage;

/// Authenticates requests against a token manager and a user store
pub struct Authenticator {
    tokens: Arc<TokenManager>,
    users: SharedUserStorage,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenManager>, users: SharedUserStorage) -> Self {
        Self { tokens, users }
    }

    /// Authenticate a raw `Authorization` header value.
    ///
    /// No store lookup happens unless a well-formed bearer token is present
    /// and verifies.
    pub async fn authenticate(&self, raw_header: Option<&str>) -> Result<User, AuthError> {
        let token = raw_header
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify(token).map_err(|e| {
            log_event(&SecurityEvent::TokenValidationFailed { reason: e.to_string() });
            e
        })?;

        self.resolve(&claims).await
    }

    /// Resolve verified claims to an active user. Fails closed.
    pub async fn resolve(&self, claims: &Claims) -> Result<User, AuthError> {
        let user = match self.users.find_by_id(claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                log_event(&SecurityEvent::AuthenticationFailed {
                    user_id: Some(claims.sub),
                    reason: "user not found".to_string(),
                });
                return Err(AuthError::Unauthenticated);
            }
            Err(e) => {
                log::error!("Identity lookup failed for {}: {}", claims.sub, e);
                return Err(AuthError::Unauthenticated);
            }
        };

        if !user.is_active {
            log_event(&SecurityEvent::AuthenticationFailed {
                user_id: Some(user.id),
                reason: "account is inactive".to_string(),
            });
            return Err(AuthError::Unauthenticated);
        }

        log_event(&SecurityEvent::AuthenticationSuccess { user_id: user.id });
        Ok(user)
    }

    /// Run the whole pipeline for a header and a requirement
    pub async fn evaluate(&self, raw_header: Option<&str>, requirement: &Requirement) -> Decision {
        match self.authenticate(raw_header).await {
            Ok(user) => {
                let decision = authorize(Some(&user), requirement);
                if decision == Decision::Deny(Denial::Forbidden) {
                    log_event(&SecurityEvent::PermissionDenied {
                        user_id: user.id,
                        requirement: requirement.to_string(),
                    });
                }
                decision
            }
            Err(_) => authorize(None, requirement),
        }
    }
}
