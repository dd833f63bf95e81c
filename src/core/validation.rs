//! Input validation for account fields

use crate::constants::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::error::{AccountsError, Result};

/// Trim and lower-case an email, then check its shape
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(AccountsError::ValidationError("Invalid email address".to_string()));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| AccountsError::ValidationError("Invalid email address".to_string()))?;

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(AccountsError::ValidationError("Invalid email address".to_string()));
    }

    Ok(email)
}

pub fn validate_password(password: &str) -> Result<()> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AccountsError::ValidationError(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AccountsError::ValidationError(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Trim an optional name; blank becomes None
pub fn normalize_name(name: Option<&str>, field: &str) -> Result<Option<String>> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if name.chars().count() > MAX_NAME_LENGTH || name.chars().any(char::is_control) {
        return Err(AccountsError::ValidationError(format!("Invalid {}", field)));
    }

    Ok(Some(name.to_string()))
}

/// Role and permission names: lowercase letters, digits, '.', '_' and '-'
pub fn validate_identifier(name: &str, kind: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(AccountsError::ValidationError(format!("Invalid {} name '{}'", kind, name)))
    }
}
