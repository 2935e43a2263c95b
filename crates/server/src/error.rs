//! HTTP-facing errors for the sqlexport server.
//!
//! Execution and encoding details are logged where they happen; the caller
//! only ever sees a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlexport_core::Error;

/// Structured errors returned to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid input parameters (e.g., empty query).
    #[error("{0}")]
    InvalidInput(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("request timed out")]
    TimedOut,

    #[error("failed to execute query")]
    ExecutionFailed,

    #[error("failed to encode query result")]
    EncodeFailed,
}

/// JSON body of an error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::TimedOut => StatusCode::REQUEST_TIMEOUT,
            ApiError::ExecutionFailed | ApiError::EncodeFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidInput(msg) => ApiError::InvalidInput(msg),
            Error::Exec(_) => ApiError::ExecutionFailed,
            Error::Encode(_) => ApiError::EncodeFailed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
