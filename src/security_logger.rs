//! Security-focused logging to track authentication and authorization events
//!
//! Events go to the `security` log target so they can be filtered with
//! `RUST_LOG=security=info`.

use uuid::Uuid;

const TARGET: &str = "security";

/// Types of security events to track
#[derive(Debug, Clone)]
pub enum SecurityEvent {
    // Authentication events
    AuthenticationSuccess { user_id: Uuid },
    AuthenticationFailed { user_id: Option<Uuid>, reason: String },
    TokenValidationFailed { reason: String },
    LoginFailed { email: String },

    // Authorization events
    PermissionDenied { user_id: Uuid, requirement: String },

    // System security
    ConfigurationError { component: String, error: String },
}

impl SecurityEvent {
    /// Short stable key for the event kind
    pub fn key(&self) -> &'static str {
        match self {
            SecurityEvent::AuthenticationSuccess { .. } => "auth_success",
            SecurityEvent::AuthenticationFailed { .. } => "auth_failed",
            SecurityEvent::TokenValidationFailed { .. } => "token_validation_failed",
            SecurityEvent::LoginFailed { .. } => "login_failed",
            SecurityEvent::PermissionDenied { .. } => "permission_denied",
            SecurityEvent::ConfigurationError { .. } => "config_error",
        }
    }

    fn level(&self) -> log::Level {
        match self {
            SecurityEvent::AuthenticationSuccess { .. } => log::Level::Debug,
            SecurityEvent::TokenValidationFailed { .. } => log::Level::Info,
            SecurityEvent::AuthenticationFailed { .. }
            | SecurityEvent::LoginFailed { .. }
            | SecurityEvent::PermissionDenied { .. } => log::Level::Warn,
            SecurityEvent::ConfigurationError { .. } => log::Level::Error,
        }
    }

    fn describe(&self) -> String {
        match self {
            SecurityEvent::AuthenticationSuccess { user_id } => {
                format!("user {} authenticated", user_id)
            }
            SecurityEvent::AuthenticationFailed { user_id, reason } => match user_id {
                Some(id) => format!("authentication failed for user {}: {}", id, reason),
                None => format!("authentication failed: {}", reason),
            },
            SecurityEvent::TokenValidationFailed { reason } => {
                format!("token rejected: {}", reason)
            }
            SecurityEvent::LoginFailed { email } => format!("failed login for {}", email),
            SecurityEvent::PermissionDenied { user_id, requirement } => {
                format!("user {} denied, requires {}", user_id, requirement)
            }
            SecurityEvent::ConfigurationError { component, error } => {
                format!("configuration error in {}: {}", component, error)
            }
        }
    }
}

/// Log a security event at a level matching its severity
pub fn log_event(event: &SecurityEvent) {
    log::log!(target: TARGET, event.level(), "[{}] {}", event.key(), event.describe());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_keys() {
        let event = SecurityEvent::PermissionDenied {
            user_id: Uuid::new_v4(),
            requirement: "roles.manage".to_string(),
        };
        assert_eq!(event.key(), "permission_denied");
        assert_eq!(event.level(), log::Level::Warn);
        assert!(event.describe().contains("roles.manage"));
    }

    #[test]
    fn test_config_errors_are_errors() {
        let event = SecurityEvent::ConfigurationError {
            component: "jwt".to_string(),
            error: "missing".to_string(),
        };
        assert_eq!(event.level(), log::Level::Error);
        log_event(&event);
    }
}
