//! API error responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use balances_core::LedgerError;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

/// Seconds a client should wait before repeating a retryable request.
const RETRY_AFTER_SECS: &str = "1";

/// Errors returned by handlers.
///
/// Rendered as `{"error": CODE, "message": text}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Ledger refused or failed the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Request could not be parsed.
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ledger(e) => StatusCode::from_u16(e.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns true if the same request may succeed later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_retryable(),
            Self::BadRequest(_) => false,
        }
    }

    /// Returns the error code for the response body.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = %status, error = %self, "Request failed");
        } else {
            debug!(status = %status, error = %self, "Request rejected");
        }

        let retryable = self.is_retryable();
        let mut response = (
            status,
            Json(json!({
                "error": self.error_code(),
                "message": self.to_string(),
            })),
        )
            .into_response();

        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}
