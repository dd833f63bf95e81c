//! Password hashing with argon2

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::error::{AccountsError, Result};

/// Hash a password into a PHC string, e.g. `$argon2id$v=19$...`
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountsError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored PHC string.
/// An unparseable hash verifies as false.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = match PasswordHash::new(password_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Stored password hash could not be parsed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// Hash of a throwaway password with the default parameters
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Run a full verification against a throwaway hash and return false.
///
/// Used when no account matches, so the failure costs as much as a wrong
/// password for a real account.
pub fn verify_dummy_password(password: &str) -> bool {
    let dummy = DUMMY_HASH.get_or_init(|| match hash_password(&Uuid::new_v4().to_string()) {
        Ok(hash) => Some(hash),
        Err(e) => {
            log::warn!("Could not prepare dummy password hash: {}", e);
            None
        }
    });

    if let Some(hash) = dummy {
        verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong horse battery", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_does_not_verify() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_dummy_verification_never_succeeds() {
        assert!(!verify_dummy_password("anything"));
        assert!(!verify_dummy_password(""));
        assert!(DUMMY_HASH.get().and_then(|h| h.as_deref()).is_some_and(|h| h.starts_with("$argon2")));
    }
}
