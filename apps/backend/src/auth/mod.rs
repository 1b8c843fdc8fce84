//! Token verification.

pub mod claims;
pub mod error;
pub mod jwks;
pub mod verifier;

pub use claims::Claims;
pub use error::AuthError;
pub use verifier::TokenVerifier;
