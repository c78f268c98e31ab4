// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use std::time::Duration;

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use polifinder_common::{Envelope, ErrorBody};
use thiserror::Error;

use crate::backend::BackendError;
use crate::validation::ValidationError;

/// Application error types, one per envelope error code
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded, retry after {}s", retry_after_secs(.retry_after))]
    RateLimited { retry_after: Duration },

    #[error("{0}")]
    AuthFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Unknown(String),
}

/// Whole seconds a client should wait, never zero
fn retry_after_secs(retry_after: &Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

impl AppError {
    /// Missing or malformed bearer credentials
    pub fn unauthorized() -> Self {
        AppError::AuthFailed("Unauthorized".to_string())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidRequest(_) => "ValidationError",
            AppError::RateLimited { .. } => "RateLimited",
            AppError::AuthFailed(_) => "AuthFailed",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::Storage(_) => "StorageError",
            AppError::Unknown(_) => "Unknown",
        }
    }

    /// Message placed in the response body.
    ///
    /// Server-side failures are sanitized; their details only go to the log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(err) => err.to_string(),
            AppError::InvalidRequest(msg) => msg.clone(),
            AppError::RateLimited { .. } => {
                "Too many requests, please try again later".to_string()
            }
            AppError::AuthFailed(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Storage(_) => "A storage error occurred".to_string(),
            AppError::Unknown(_) => "An internal server error occurred".to_string(),
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            AppError::RateLimited { retry_after } => Some(retry_after_secs(retry_after)),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.error_code(), error = %self, "request rejected");
        }

        let retry_after = self.retry_after();
        let body: Envelope<()> = Envelope::err(ErrorBody {
            code: self.error_code().to_string(),
            message: self.public_message(),
            retry_after,
        });

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::AuthFailed(msg) => AppError::AuthFailed(msg),
            BackendError::NotFound(msg) => AppError::NotFound(msg),
            BackendError::Conflict(msg) => AppError::Conflict(msg),
            BackendError::Storage(msg) => AppError::Storage(msg),
            BackendError::Unknown(msg) => AppError::Unknown(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::InvalidRequest(err.body_text())
    }
}
