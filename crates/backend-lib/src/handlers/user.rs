//! The caller's own profile and account.
use std::sync::Arc;

use axum::extract::State;
use metrics::counter;
use polifinder_common::{DeletedPayload, ProfileRecord, ProfileUpdate};
use tracing::{info, instrument};

use super::rules;
use crate::auth::BearerToken;
use crate::error::AppError;
use crate::middleware::ClientIdentity;
use crate::response::{ApiJson, ApiResponse};
use crate::telemetry::keys;
use crate::validation;
use crate::AppState;

#[instrument(skip_all)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
) -> Result<ApiResponse<ProfileRecord>, AppError> {
    let user = state.backend.get_current_user(token.as_str()).await?;
    let profile = state.backend.get_profile(user.id).await?;
    Ok(ApiResponse::ok(profile))
}

#[instrument(skip_all, fields(client = %identity.as_str()))]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    token: BearerToken,
    ApiJson(mut update): ApiJson<ProfileUpdate>,
) -> Result<ApiResponse<ProfileRecord>, AppError> {
    validation::normalize_profile_update(&mut update);
    validation::validate_profile_update(&update, &state.settings.profile_limits)?;

    state.enforce_rate_limit(identity.as_str(), rules::PROFILE_UPDATE)?;

    let user = state.backend.get_current_user(token.as_str()).await?;
    let profile = state.backend.update_profile(user.id, &update).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(ApiResponse::ok(profile))
}

#[instrument(skip_all, fields(client = %identity.as_str()))]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    token: BearerToken,
) -> Result<ApiResponse<DeletedPayload>, AppError> {
    state.enforce_rate_limit(identity.as_str(), rules::DELETE_ACCOUNT)?;

    let user = state.backend.get_current_user(token.as_str()).await?;
    state.backend.delete_user(user.id).await?;

    counter!(keys::ACCOUNTS_DELETED).increment(1);
    info!(user_id = %user.id, "account deleted");
    Ok(ApiResponse::ok(DeletedPayload { deleted: true }))
}
