// ==============
// crates/backend-lib/src/telemetry.rs

//! Tracing subscriber setup and the metric keys recorded across the service.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Central place for metric keys
pub mod keys {
    pub const SESSION_CREATED: &str = "session.created";
    pub const SESSION_EXPIRED: &str = "session.expired";
    pub const SESSION_ACTIVE: &str = "session.active";
    pub const LOGIN_SUCCESS: &str = "auth.login.success";
    pub const LOGIN_FAILURE: &str = "auth.login.failure";
    pub const RATE_LIMITED: &str = "rate_limit.rejected";
    pub const RATE_LIMIT_KEYS: &str = "rate_limit.keys";
    pub const UPLOADS: &str = "attachments.uploaded";
    pub const UPLOAD_BYTES: &str = "attachments.bytes";
    pub const ACCOUNTS_DELETED: &str = "accounts.deleted";
    pub const MODERATION_CHECKS: &str = "moderation.checks";
    pub const MODERATION_REMOVED: &str = "moderation.removed";
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_tracing(level: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    let result = match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
    };
    if let Err(err) = result {
        tracing::debug!(%err, "tracing subscriber already installed");
    }
}
