use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

use rusty_accounts::auth::token::{verify, Claims, TokenManager};
use rusty_accounts::error::AuthError;

const SECRET: &str = "q8Zr4mW1xT7vB2nK9pL5sD3fH6jG0cY!";
const OTHER_SECRET: &str = "Lp3!vQ9zR2xM7kW4nB8tY1cF6hJ0dS5g";

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[test]
fn test_token_round_trip() {
    let manager = TokenManager::new(SECRET, 24).unwrap();
    let user_id = Uuid::new_v4();
    let claims = Claims::new(user_id, "alice@example.com".to_string(), manager.ttl_hours());

    let token = manager.generate_token(&claims).unwrap();
    let verified = verify(&token, SECRET).unwrap();

    assert_eq!(verified.sub, user_id);
    assert_eq!(verified.email, "alice@example.com");
    assert_eq!(verified.exp - verified.iat, 24 * 3600);
}

#[test]
fn test_wrong_secret_is_invalid() {
    let manager = TokenManager::new(SECRET, 1).unwrap();
    let claims = Claims::new(Uuid::new_v4(), "bob@example.com".to_string(), 1);
    let token = manager.generate_token(&claims).unwrap();

    assert_eq!(verify(&token, OTHER_SECRET), Err(AuthError::InvalidToken));
}

#[test]
fn test_expired_token_is_invalid() {
    let manager = TokenManager::new(SECRET, 1).unwrap();
    let now = now() as usize;
    let claims = Claims {
        sub: Uuid::new_v4(),
        email: "carol@example.com".to_string(),
        iat: now - 7200,
        exp: now - 1,
    };
    let token = manager.generate_token(&claims).unwrap();

    assert_eq!(manager.verify(&token), Err(AuthError::InvalidToken));
}

#[test]
fn test_other_algorithm_is_invalid() {
    let claims = Claims::new(Uuid::new_v4(), "dave@example.com".to_string(), 1);
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(verify(&token, SECRET), Err(AuthError::InvalidToken));
}

#[test]
fn test_missing_expiry_is_invalid() {
    let token = encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": Uuid::new_v4(), "email": "erin@example.com", "iat": now() }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(verify(&token, SECRET), Err(AuthError::InvalidToken));
}

#[test]
fn test_malformed_tokens_are_invalid() {
    for token in ["", "not-a-jwt", "a.b.c", "invalid.token.here"] {
        assert_eq!(verify(token, SECRET), Err(AuthError::InvalidToken), "token {:?}", token);
    }
}

#[test]
fn test_blank_secret_is_missing() {
    assert_eq!(verify("a.b.c", "   ").unwrap_err(), AuthError::MissingSecret);
    assert_eq!(TokenManager::new("", 24).err(), Some(AuthError::MissingSecret));
}
