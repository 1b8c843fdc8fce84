use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;
use crate::extractors::auth_token::AuthToken;
use crate::state::app_state::AppState;
use crate::trace_ctx;

/// The verified identity behind a request.
///
/// Extraction verifies the bearer token against the configured key material.
/// Every failure mode is logged with its reason but surfaced as the same
/// 401, so callers cannot probe which check rejected them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CurrentUser {
    pub sub: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let token_fut = AuthToken::from_request(req, payload);
        let req = req.clone();

        Box::pin(async move {
            let token = token_fut.await?;

            let app_state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::internal("AppState not available"))?;

            match app_state.verifier.verify(&token.token).await {
                Ok(claims) => Ok(CurrentUser {
                    sub: claims.sub,
                    email: claims.email,
                    role: claims.role,
                }),
                Err(err) => {
                    warn!(
                        trace_id = %trace_ctx::trace_id(),
                        reason = %err,
                        "Token verification failed"
                    );
                    Err(AppError::unauthorized())
                }
            }
        })
    }
}
