//! HTTP error bodies
//!
//! Every failure leaves the server as `{ "error": ..., "code": ... }`.
//! Server-side detail (paths, I/O messages) is logged, never returned.

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::auth::errors::AuthError;
use crate::file_storage::errors::StorageError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Rejection type shared by all handlers
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: status.as_u16(),
        }),
    )
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        Self {
            error: err.to_string(),
            code: err.status_code(),
        }
    }
}

pub fn auth_error(err: AuthError) -> ApiError {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::UNAUTHORIZED);
    if err.is_client_error() {
        tracing::debug!(error = %err, "request rejected");
    } else {
        tracing::error!(error = %err, "auth failure");
    }

    // Internal detail stays in the log.
    let body = match err {
        AuthError::StorageError(_) | AuthError::DirectoryError(_) => ErrorResponse {
            error: "Internal server error".to_string(),
            code: status.as_u16(),
        },
        other => ErrorResponse::from(other),
    };
    (status, Json(body))
}

pub fn storage_error(err: StorageError) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "storage failure");
    } else {
        tracing::debug!(error = %err, "storage request rejected");
    }
    api_error(status, err.public_message())
}
