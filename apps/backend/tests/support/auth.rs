//! JWT token generation helpers for tests

use std::time::{SystemTime, UNIX_EPOCH};

use backend::auth::claims::Claims;
use backend::state::security_config::SecurityConfig;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64
}

fn sign_hs256(claims: &Claims, sec: &SecurityConfig) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(&sec.jwt_secret),
    )
    .expect("should mint token successfully")
}

/// Mint an HS256 bearer token for the given sub (without "Bearer " prefix).
pub fn mint_test_token(sub: &str, sec: &SecurityConfig) -> String {
    let mut claims = Claims::for_subject(sub);
    claims.iat = Some(now_secs());
    claims.exp = Some(now_secs() + 15 * 60);
    sign_hs256(&claims, sec)
}

/// Mint a full Authorization header value including the "Bearer " prefix.
pub fn bearer_header(sub: &str, sec: &SecurityConfig) -> String {
    format!("Bearer {}", mint_test_token(sub, sec))
}

/// Mint an already-expired token for rejection tests.
pub fn mint_expired_token(sub: &str, sec: &SecurityConfig) -> String {
    let mut claims = Claims::for_subject(sub);
    claims.iat = Some(now_secs() - 7200);
    claims.exp = Some(now_secs() - 3600);
    sign_hs256(&claims, sec)
}
