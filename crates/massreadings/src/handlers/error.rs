use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use massreadings_core::cache::{lookup_error_to_status_code, LookupError};

pub struct AppError(pub anyhow::Error);

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let Some(lookup_error) = self.0.downcast_ref::<LookupError>() else {
            tracing::error!(error = %self.0, "Unhandled error");
            let body = ErrorBody {
                error: "internal",
                message: self.0.to_string(),
                retry_after_seconds: None,
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        };

        let status = StatusCode::from_u16(lookup_error_to_status_code(lookup_error))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                error = %lookup_error,
                kind = lookup_error.kind(),
                "Readings lookup failed"
            );
        }
        let retry_after_seconds = lookup_error.retry_after().map(whole_seconds);
        let body = ErrorBody {
            error: lookup_error.kind(),
            message: lookup_error.to_string(),
            retry_after_seconds,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after_seconds {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// `Retry-After` carries whole seconds; round up so clients never retry early.
fn whole_seconds(remaining: Duration) -> u64 {
    let seconds = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        seconds.saturating_add(1)
    } else {
        seconds.max(1)
    }
}
