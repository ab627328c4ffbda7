//! JSON envelope and error responses for the read API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome marker carried by every response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    /// The request succeeded and `data` is present.
    #[serde(rename = "OK")]
    Ok,
    /// The request failed and `error` is present.
    #[serde(rename = "Error")]
    Error,
}

/// Envelope wrapping every read API body: `{"status", "error"?, "data"?}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub status: ResponseStatus,
    /// Human-readable failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            status: ResponseStatus::Ok,
            error: None,
            data: Some(data),
        }
    }

    /// Failed response carrying only an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            error: Some(message.into()),
            data: None,
        }
    }
}

/// Read API failures and their HTTP status codes.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No record exists for the requested date.
    #[error("apod not found")]
    NotFound,

    /// The path segment is not a `YYYY-MM-DD` date.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The store failed; the message names the operation, never the cause.
    #[error("{operation}")]
    Storage {
        /// Client-facing description of the failed operation.
        operation: &'static str,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Middleware failed for a reason other than a timeout.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidDate(_) => StatusCode::BAD_REQUEST,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Storage { .. } | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.to_string());
        (self.status_code(), Json(body)).into_response()
    }
}
