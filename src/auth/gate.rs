//! Authorization gate
//!
//! Decides whether a resolved identity satisfies a requirement. Stateless
//! and side-effect free: turning a decision into a response is the caller's
//! job.

use serde::{Deserialize, Serialize};

use crate::auth::user::User;
use crate::constants::{ADMIN_ROLE, MODERATOR_ROLE};
use crate::error::AuthError;

/// The capability a protected operation demands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    /// Identity must hold at least one of these roles (exact name match)
    AnyOfRoles(Vec<String>),
    /// Identity must hold this permission through an active role
    HasPermission(String),
}

impl Requirement {
    /// Gate used by the user administration endpoints
    pub fn admin() -> Self {
        Self::any_of_roles(&[ADMIN_ROLE, MODERATOR_ROLE])
    }

    pub fn any_of_roles(names: &[&str]) -> Self {
        Self::AnyOfRoles(names.iter().map(|name| name.to_string()).collect())
    }

    pub fn permission(name: &str) -> Self {
        Self::HasPermission(name.to_string())
    }

    /// Check the requirement against an identity
    pub fn is_met_by(&self, user: &User) -> bool {
        match self {
            Self::AnyOfRoles(names) => names.iter().any(|name| user.has_role(name)),
            Self::HasPermission(name) => user.has_permission(name),
        }
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnyOfRoles(names) => write!(f, "any of roles [{}]", names.join(", ")),
            Self::HasPermission(name) => write!(f, "permission '{}'", name),
        }
    }
}

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden,
}

impl From<Denial> for AuthError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => AuthError::Unauthenticated,
            Denial::Forbidden => AuthError::Forbidden,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial.into()),
        }
    }
}

/// Authorize an optional identity against a requirement
pub fn authorize(identity: Option<&User>, requirement: &Requirement) -> Decision {
    match identity {
        None => Decision::Deny(Denial::Unauthenticated),
        Some(user) if requirement.is_met_by(user) => Decision::Allow,
        Some(_) => Decision::Deny(Denial::Forbidden),
    }
}
