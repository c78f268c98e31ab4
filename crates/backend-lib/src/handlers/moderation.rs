use std::sync::Arc;

use axum::extract::State;
use metrics::counter;
use polifinder_common::ModerationRequest;
use tracing::{debug, instrument};

use super::rules;
use crate::error::AppError;
use crate::middleware::ClientIdentity;
use crate::moderation::{score_content, ModerationAction, ModerationScore};
use crate::response::{ApiJson, ApiResponse};
use crate::telemetry::keys;
use crate::validation;
use crate::AppState;

#[instrument(skip_all, fields(client = %identity.as_str()))]
pub async fn check(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    ApiJson(request): ApiJson<ModerationRequest>,
) -> Result<ApiResponse<ModerationScore>, AppError> {
    let content = validation::validate_content(&request.content)?;

    state.enforce_rate_limit(identity.as_str(), rules::MODERATION)?;

    let result = score_content(content);
    counter!(keys::MODERATION_CHECKS).increment(1);
    if result.action == ModerationAction::Remove {
        counter!(keys::MODERATION_REMOVED).increment(1);
    }
    debug!(score = result.score, action = ?result.action, "content scored");
    Ok(ApiResponse::ok(result))
}
