// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP route handlers.
//!
//! Each handler runs the same sequence: extract and validate input, charge
//! the caller's rate-limit budget, delegate to the backend, wrap the result
//! in the envelope. A failure at any step short-circuits the rest.

pub mod auth;
pub mod moderation;
pub mod posts;
pub mod user;

use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use polifinder_common::HealthPayload;

use crate::error::AppError;
use crate::response::ApiResponse;

/// Rate-limit rule names used by the handlers
pub mod rules {
    pub const LOGIN: &str = "login";
    pub const REFRESH: &str = "refresh";
    pub const RESET_PASSWORD: &str = "reset_password";
    pub const UPDATE_PASSWORD: &str = "update_password";
    pub const PROFILE_UPDATE: &str = "profile_update";
    pub const DELETE_ACCOUNT: &str = "delete_account";
    pub const UPLOAD: &str = "upload";
    pub const MODERATION: &str = "moderation";
}

pub async fn health() -> ApiResponse<HealthPayload> {
    ApiResponse::ok(HealthPayload {
        status: "ok".to_string(),
    })
}

/// Enveloped 404 for paths with no route
pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Enveloped 405 for a known path hit with the wrong method
pub async fn method_not_allowed(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        AppError::NotFound(format!("{method} is not supported on {}", uri.path())),
    )
}
