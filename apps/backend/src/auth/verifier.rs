//! Bearer token verification.
//!
//! The token's own header picks the verification path: HS256 tokens check
//! against the shared secret, RS256 tokens against a JWKS key matched by
//! exact `kid`. There is no default-key fallback; anything else the header
//! declares is rejected outright.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::claims::Claims;
use super::error::AuthError;
use super::jwks::JwksResolver;
use crate::state::security_config::SecurityConfig;

pub struct TokenVerifier {
    security: SecurityConfig,
    jwks: Option<JwksResolver>,
}

/// The token header as sent, before any algorithm whitelisting.
///
/// Parsed by hand rather than through `jsonwebtoken::decode_header` so that
/// an unknown `alg` string ("none", "HS384", ...) is reported as an
/// unsupported algorithm instead of a parse failure.
#[derive(Debug, Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

impl TokenVerifier {
    pub fn new(security: SecurityConfig) -> Self {
        let jwks = security
            .jwks_endpoint()
            .map(|endpoint| JwksResolver::new(endpoint, security.jwks_ttl));
        Self { security, jwks }
    }

    /// Verify a bearer token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = parse_header(token)?;

        match header.alg.as_str() {
            "HS256" => self.verify_hs256(token),
            "RS256" => self.verify_rs256(token, header.kid).await,
            other => Err(AuthError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    fn verify_hs256(&self, token: &str) -> Result<Claims, AuthError> {
        let key = DecodingKey::from_secret(&self.security.jwt_secret);
        decode::<Claims>(token, &key, &validation(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(map_jwt_err)
    }

    async fn verify_rs256(&self, token: &str, kid: Option<String>) -> Result<Claims, AuthError> {
        let kid = match kid {
            Some(kid) if !kid.is_empty() => kid,
            // RS256 keys are matched by kid only; a token without one can
            // never resolve a key.
            _ => return Err(AuthError::KeyNotFound("<none>".to_string())),
        };

        let resolver = self.jwks.as_ref().ok_or_else(|| {
            AuthError::DiscoveryUnavailable("no JWKS endpoint configured".to_string())
        })?;

        let jwk = resolver.resolve(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            tracing::warn!(kid = %kid, error = %e, "JWKS key could not be used for verification");
            AuthError::KeyNotFound(kid.clone())
        })?;

        decode::<Claims>(token, &key, &validation(Algorithm::RS256))
            .map(|data| data.claims)
            .map_err(map_jwt_err)
    }
}

fn parse_header(token: &str) -> Result<RawHeader, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(AuthError::Malformed(
            "token must have three segments".to_string(),
        ));
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(parts[0])
        .map_err(|_| AuthError::Malformed("header is not valid base64url".to_string()))?;

    serde_json::from_slice(&header_bytes)
        .map_err(|_| AuthError::Malformed("header is not valid JSON".to_string()))
}

/// Claims validation shared by both algorithms: `exp` is honored when
/// present with zero clock leeway, and no claim is mandatory.
fn validation(alg: Algorithm) -> Validation {
    let mut validation = Validation::new(alg);
    validation.required_spec_claims.clear();
    validation.leeway = 0;
    validation.validate_aud = false;
    validation
}

fn map_jwt_err(e: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        _ => AuthError::Malformed(e.to_string()),
    }
}
