//! JWKS key resolution with a TTL cache.
//!
//! Keys are looked up by exact `kid`. A cache miss always triggers a fresh
//! fetch before the token is rejected, so key rotation works without a
//! restart and the cache stays a pure optimization.

use std::time::Duration;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use moka::future::Cache;

use super::error::AuthError;

pub struct JwksResolver {
    endpoint: String,
    client: reqwest::Client,
    keys: Cache<String, Jwk>,
}

impl JwksResolver {
    pub fn new(endpoint: String, ttl: Duration) -> Self {
        let keys = Cache::builder().time_to_live(ttl).build();
        Self {
            endpoint,
            client: reqwest::Client::new(),
            keys,
        }
    }

    /// Look up a key by `kid`, refreshing from the endpoint on a miss.
    ///
    /// Returns `KeyNotFound` only after a successful fetch still has no
    /// matching key; fetch failures are `DiscoveryUnavailable` instead so a
    /// flaky endpoint is never mistaken for a rotated-away key.
    pub async fn resolve(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(jwk) = self.keys.get(kid).await {
            return Ok(jwk);
        }

        self.refresh().await?;

        self.keys
            .get(kid)
            .await
            .ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))
    }

    async fn refresh(&self) -> Result<(), AuthError> {
        tracing::debug!(endpoint = %self.endpoint, "refreshing JWKS cache");

        let response = self.client.get(&self.endpoint).send().await.map_err(|e| {
            AuthError::DiscoveryUnavailable(format!(
                "failed to fetch JWKS from '{}': {e}",
                self.endpoint
            ))
        })?;

        if !response.status().is_success() {
            return Err(AuthError::DiscoveryUnavailable(format!(
                "JWKS request to '{}' returned status {}",
                self.endpoint,
                response.status()
            )));
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            AuthError::DiscoveryUnavailable(format!(
                "failed to parse JWKS JSON from '{}': {e}",
                self.endpoint
            ))
        })?;

        let mut cached = 0usize;
        for jwk in jwks.keys {
            if let Some(kid) = jwk.common.key_id.clone() {
                self.keys.insert(kid, jwk).await;
                cached += 1;
            }
        }
        tracing::debug!(keys = cached, "JWKS cache refreshed");

        Ok(())
    }
}
