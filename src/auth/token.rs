use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::user::User;
use crate::constants::MAX_TOKEN_LENGTH;
use crate::error::{AccountsError, AuthError, Result};

/// JWT Claims structure
///
/// Every field is required and unknown fields are rejected, so a token that
/// decodes is a token this server could have issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Email at issue time
    pub email: String,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
}

impl Claims {
    /// Creates claims valid for `ttl_hours` from now
    pub fn new(user_id: Uuid, email: String, ttl_hours: u64) -> Self {
        let now = now_timestamp();
        Self {
            sub: user_id,
            email,
            iat: now,
            exp: now + (ttl_hours as usize * 3600),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        now_timestamp() >= self.exp
    }
}

fn now_timestamp() -> usize {
    chrono::Utc::now().timestamp().max(0) as usize
}

fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

fn decode_claims(token: &str, key: &DecodingKey, validation: &Validation) -> std::result::Result<Claims, AuthError> {
    if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
        return Err(AuthError::InvalidToken);
    }

    let data = decode::<Claims>(token, key, validation).map_err(|e| {
        log::debug!("Token rejected: {}", e);
        AuthError::InvalidToken
    })?;

    // iat must precede exp
    if data.claims.is_expired() || data.claims.exp <= data.claims.iat {
        return Err(AuthError::InvalidToken);
    }

    Ok(data.claims)
}

/// Verifies a token against a secret and returns its claims.
///
/// Pure function of its inputs: fails with `MissingSecret` when the secret is
/// blank and with `InvalidToken` for anything malformed, expired or signed
/// with another key.
pub fn verify(token: &str, secret: &str) -> std::result::Result<Claims, AuthError> {
    if secret.trim().is_empty() {
        return Err(AuthError::MissingSecret);
    }
    decode_claims(token, &DecodingKey::from_secret(secret.as_bytes()), &strict_validation())
}

/// Manages JWT token operations
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_hours: u64,
}

impl TokenManager {
    /// Creates a new token manager with a secret.
    ///
    /// A blank secret is a startup error, never a per-request one.
    pub fn new(secret: &str, ttl_hours: u64) -> std::result::Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: strict_validation(),
            ttl_hours,
        })
    }

    pub fn ttl_hours(&self) -> u64 {
        self.ttl_hours
    }

    /// Generates a JWT token for the given claims
    pub fn generate_token(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AccountsError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Issues a token for a user with the configured lifetime
    pub fn issue_for(&self, user: &User) -> Result<String> {
        let claims = Claims::new(user.id, user.email.clone(), self.ttl_hours);
        self.generate_token(&claims)
    }

    /// Validates and decodes a JWT token
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        decode_claims(token, &self.decoding_key, &self.validation)
    }
}

/// Extracts bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-signing-key-0123456789abcdef";

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Bearer   abc  "), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("bearer abc"), None);
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        assert_eq!(TokenManager::new("   ", 1).err(), Some(AuthError::MissingSecret));
        assert_eq!(verify("a.b.c", "").err(), Some(AuthError::MissingSecret));
    }

    #[test]
    fn test_oversized_token_is_invalid() {
        let manager = TokenManager::new(SECRET, 1).unwrap();
        let token = "a".repeat(MAX_TOKEN_LENGTH + 1);
        assert_eq!(manager.verify(&token).err(), Some(AuthError::InvalidToken));
    }

    #[test]
    fn test_unknown_claim_is_invalid() {
        #[derive(Serialize)]
        struct Extended {
            sub: Uuid,
            email: String,
            iat: usize,
            exp: usize,
            role: String,
        }

        let claims = Claims::new(Uuid::new_v4(), "a@example.com".to_string(), 1);
        let extended = Extended {
            sub: claims.sub,
            email: claims.email,
            iat: claims.iat,
            exp: claims.exp,
            role: "admin".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &extended,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify(&token, SECRET).err(), Some(AuthError::InvalidToken));
    }

    #[test]
    fn test_missing_claim_is_invalid() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": Uuid::new_v4(), "exp": now_timestamp() + 3600 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify(&token, SECRET).err(), Some(AuthError::InvalidToken));
    }

    #[test]
    fn test_non_uuid_subject_is_invalid() {
        let now = now_timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "user123", "email": "a@example.com", "iat": now, "exp": now + 3600 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify(&token, SECRET).err(), Some(AuthError::InvalidToken));
    }
}
