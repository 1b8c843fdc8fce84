use actix_web::{dev::Payload, http::header, FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Bearer token pulled from the Authorization header.
///
/// Only the `Bearer <token>` shape is accepted; a missing or malformed
/// header is the same 401 as a bad token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthToken {
    pub token: String,
}

impl FromRequest for AuthToken {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .ok_or_else(AppError::unauthorized)?;

            let auth_value = auth_header.to_str().map_err(|_| AppError::unauthorized())?;

            let parts: Vec<&str> = auth_value.split_whitespace().collect();
            if parts.len() != 2 || parts[0] != "Bearer" {
                return Err(AppError::unauthorized());
            }

            Ok(AuthToken {
                token: parts[1].to_string(),
            })
        })
    }
}
