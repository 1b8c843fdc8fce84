use std::env;
use std::time::Duration;

use crate::error::AppError;

/// How long resolved JWKS keys are trusted before a refetch.
const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(300);

/// Configuration for token verification.
///
/// HS256 tokens are verified against `jwt_secret`. RS256 tokens need a key
/// source: either a discovery base URL (the JWKS document is expected at
/// `<base>/.well-known/jwks.json`) or an explicit JWKS URL override.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Shared secret for HS256 signing and verification
    pub jwt_secret: Vec<u8>,
    /// Identity provider base URL for JWKS discovery
    pub discovery_url: Option<String>,
    /// Explicit JWKS document URL; takes precedence over discovery
    pub jwks_url: Option<String>,
    /// Cache lifetime for resolved JWKS keys
    pub jwks_ttl: Duration,
}

impl SecurityConfig {
    /// Create a new SecurityConfig with the given JWT secret
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            discovery_url: None,
            jwks_url: None,
            jwks_ttl: DEFAULT_JWKS_TTL,
        }
    }

    pub fn with_discovery_url(mut self, url: impl Into<String>) -> Self {
        self.discovery_url = Some(url.into());
        self
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = Some(url.into());
        self
    }

    pub fn with_jwks_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_ttl = ttl;
        self
    }

    /// Read security settings from the environment.
    ///
    /// `BACKEND_JWT_SECRET` is required. `AUTH_DISCOVERY_URL`, `AUTH_JWKS_URL`
    /// and `AUTH_JWKS_TTL_SECS` are optional; without a key source RS256
    /// tokens are rejected.
    pub fn from_env() -> Result<Self, AppError> {
        let jwt_secret = env::var("BACKEND_JWT_SECRET").map_err(|_| {
            AppError::config("Required environment variable 'BACKEND_JWT_SECRET' is not set")
        })?;

        let mut config = Self::new(jwt_secret.into_bytes());

        if let Ok(url) = env::var("AUTH_DISCOVERY_URL") {
            config = config.with_discovery_url(url);
        }
        if let Ok(url) = env::var("AUTH_JWKS_URL") {
            config = config.with_jwks_url(url);
        }
        if let Ok(raw) = env::var("AUTH_JWKS_TTL_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| {
                AppError::config(format!(
                    "AUTH_JWKS_TTL_SECS must be a positive integer, got '{raw}'"
                ))
            })?;
            config = config.with_jwks_ttl(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// The JWKS document URL, if any key source is configured.
    pub fn jwks_endpoint(&self) -> Option<String> {
        if let Some(url) = &self.jwks_url {
            return Some(url.clone());
        }
        self.discovery_url
            .as_ref()
            .map(|base| format!("{}/.well-known/jwks.json", base.trim_end_matches('/')))
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::new(b"default_secret_for_tests_only".to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwks_endpoint_from_discovery_base() {
        let config = SecurityConfig::default().with_discovery_url("https://id.example.com/");
        assert_eq!(
            config.jwks_endpoint().as_deref(),
            Some("https://id.example.com/.well-known/jwks.json")
        );
    }

    #[test]
    fn jwks_override_wins_over_discovery() {
        let config = SecurityConfig::default()
            .with_discovery_url("https://id.example.com")
            .with_jwks_url("https://keys.example.com/jwks.json");
        assert_eq!(
            config.jwks_endpoint().as_deref(),
            Some("https://keys.example.com/jwks.json")
        );
    }

    #[test]
    fn no_key_source_means_no_endpoint() {
        assert_eq!(SecurityConfig::default().jwks_endpoint(), None);
    }
}
