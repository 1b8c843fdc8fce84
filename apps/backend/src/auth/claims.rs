//! JWT claims accepted by this service.

use serde::{Deserialize, Serialize};

/// Claims carried by a verified access token.
///
/// Only `sub` is required; it becomes the owner identity for every job
/// operation. `exp` is honored when present and ignored when absent.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Stable subject identifier; used as the job owner key
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issued-at (seconds since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry (seconds since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Minimal claims for the given subject.
    pub fn for_subject(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            email: None,
            role: None,
            iat: None,
            exp: None,
        }
    }
}
