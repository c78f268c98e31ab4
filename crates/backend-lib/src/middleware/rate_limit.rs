use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use super::ClientIdentity;
use crate::{error::AppError, AppState};

/// Name of the rule every request is counted against
pub const GLOBAL_RULE: &str = "global";

/// Global per-client rate limiter, applied ahead of routing
pub async fn global_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let identity = ClientIdentity::from_parts(&parts, &state.settings.rate_limit.trusted_proxies);
    state.enforce_rate_limit(identity.as_str(), GLOBAL_RULE)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}
