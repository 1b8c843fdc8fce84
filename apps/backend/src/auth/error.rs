//! Token rejection reasons.
//!
//! Every variant surfaces to HTTP callers as the same uniform 401; the
//! variant itself exists so logs can say why a token was turned away.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Token structure could not be parsed (segments, base64, JSON, claims).
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Token declares an algorithm this service does not accept.
    #[error("unsupported algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    /// No key matching the token's kid, even after a fresh JWKS fetch.
    #[error("no key found for kid '{0}'")]
    KeyNotFound(String),

    /// The JWKS endpoint could not be reached or returned garbage.
    #[error("key discovery unavailable: {0}")]
    DiscoveryUnavailable(String),

    /// Signature did not verify against the resolved key.
    #[error("invalid signature")]
    SignatureInvalid,

    /// The exp claim is in the past.
    #[error("token expired")]
    Expired,
}
