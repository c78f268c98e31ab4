//! Session lifecycle: login, logout, refresh, password reset and update.
use std::sync::Arc;

use axum::extract::State;
use metrics::counter;
use polifinder_common::{
    LoginRequest, MessagePayload, RefreshRequest, ResetPasswordRequest, SessionPayload,
    UpdatePasswordRequest, UserPayload,
};
use tracing::{info, instrument};

use super::rules;
use crate::auth::BearerToken;
use crate::error::AppError;
use crate::middleware::ClientIdentity;
use crate::response::{ApiJson, ApiResponse};
use crate::telemetry::keys;
use crate::validation;
use crate::AppState;

#[instrument(skip_all, fields(client = %identity.as_str()))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<ApiResponse<SessionPayload>, AppError> {
    let email = validation::validate_email(request.email.trim())?;
    let password = validation::validate_credential(&request.password)?;

    state.enforce_rate_limit(identity.as_str(), rules::LOGIN)?;

    match state.backend.sign_in(email, password).await {
        Ok(session) => {
            counter!(keys::LOGIN_SUCCESS).increment(1);
            info!(user_id = %session.user_id, "login succeeded");
            Ok(ApiResponse::ok(SessionPayload { session }))
        }
        Err(err) => {
            counter!(keys::LOGIN_FAILURE).increment(1);
            Err(err.into())
        }
    }
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
) -> Result<ApiResponse<MessagePayload>, AppError> {
    state.backend.sign_out(token.as_str()).await?;
    Ok(ApiResponse::ok(MessagePayload::new("Logged out")))
}

#[instrument(skip_all)]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
) -> Result<ApiResponse<UserPayload>, AppError> {
    let user = state.backend.get_current_user(token.as_str()).await?;
    Ok(ApiResponse::ok(UserPayload { user }))
}

#[instrument(skip_all, fields(client = %identity.as_str()))]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<ApiResponse<SessionPayload>, AppError> {
    let refresh_token = validation::validate_refresh_token(&request.refresh_token)?;

    state.enforce_rate_limit(identity.as_str(), rules::REFRESH)?;

    let session = state.backend.refresh_session(refresh_token).await?;
    Ok(ApiResponse::ok(SessionPayload { session }))
}

#[instrument(skip_all, fields(client = %identity.as_str()))]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<ApiResponse<MessagePayload>, AppError> {
    let email = validation::validate_email(request.email.trim())?;
    if let Some(redirect) = request.redirect_to.as_deref() {
        validation::validate_redirect(redirect)?;
    }

    state.enforce_rate_limit(identity.as_str(), rules::RESET_PASSWORD)?;

    state
        .backend
        .request_password_reset(email, request.redirect_to.as_deref())
        .await?;
    Ok(ApiResponse::ok(MessagePayload::new(
        "If an account exists for that address, a reset link has been sent",
    )))
}

#[instrument(skip_all, fields(client = %identity.as_str()))]
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    token: BearerToken,
    ApiJson(request): ApiJson<UpdatePasswordRequest>,
) -> Result<ApiResponse<MessagePayload>, AppError> {
    let password =
        validation::validate_password(&request.password, &state.settings.password_requirements)?;

    state.enforce_rate_limit(identity.as_str(), rules::UPDATE_PASSWORD)?;

    state.backend.update_password(token.as_str(), password).await?;
    Ok(ApiResponse::ok(MessagePayload::new("Password updated")))
}
