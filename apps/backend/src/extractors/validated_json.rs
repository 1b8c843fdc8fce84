use std::ops::{Deref, DerefMut};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Error as JsonError;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::trace_ctx;

/// JSON body extractor whose failures use the problem-details envelope.
///
/// The stock `web::Json` rejects with actix's own error body; this one maps
/// parse failures to the project's 400 shape and keeps the raw serde detail
/// out of the response.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for ValidatedJson<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(_req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let mut payload = payload.take();

        Box::pin(async move {
            let trace_id = trace_ctx::trace_id();

            let mut body = BytesMut::new();
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| {
                    warn!(
                        trace_id = %trace_id,
                        error = %e,
                        "Failed to read request body chunk"
                    );
                    AppError::bad_request(ErrorCode::BadRequest, "Failed to read request body")
                })?;
                body.extend_from_slice(&chunk);
            }

            let parsed = serde_json::from_slice::<T>(&body).map_err(|e| {
                let detail = classify_json_error(&e);
                debug!(
                    trace_id = %trace_id,
                    error = %e,
                    body_size = body.len(),
                    "JSON parsing failed"
                );
                AppError::bad_request(ErrorCode::BadRequest, detail)
            })?;

            Ok(ValidatedJson(parsed))
        })
    }
}

/// Sanitized description of a serde_json failure.
fn classify_json_error(error: &JsonError) -> String {
    match error.classify() {
        serde_json::error::Category::Syntax => {
            let line = error.line();
            format!("Invalid JSON at line {line}")
        }
        serde_json::error::Category::Eof => "Invalid JSON: unexpected end of input".to_string(),
        serde_json::error::Category::Data => {
            "Invalid JSON: wrong types for one or more fields".to_string()
        }
        serde_json::error::Category::Io => "Invalid JSON: I/O error while reading body".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct SubmitBody {
        pub payload: serde_json::Value,
    }

    #[test]
    fn syntax_errors_mention_the_line() {
        let error = serde_json::from_str::<SubmitBody>(r#"{"payload": }"#).unwrap_err();
        assert!(classify_json_error(&error).contains("Invalid JSON at line"));
    }

    #[test]
    fn truncated_body_reads_as_unexpected_eof() {
        let error = serde_json::from_str::<SubmitBody>(r#"{"payload""#).unwrap_err();
        assert!(classify_json_error(&error).contains("unexpected end of input"));
    }

    #[test]
    fn type_mismatches_stay_generic() {
        #[derive(Debug, Deserialize)]
        struct Strict {
            #[allow(dead_code)]
            count: u32,
        }
        let error = serde_json::from_str::<Strict>(r#"{"count": "three"}"#).unwrap_err();
        assert!(classify_json_error(&error).contains("wrong types"));
    }

    #[test]
    fn into_inner_unwraps_the_body() {
        let body = ValidatedJson(SubmitBody {
            payload: serde_json::json!({"kind": "noop"}),
        });
        assert_eq!(body.into_inner().payload["kind"], "noop");
    }
}
