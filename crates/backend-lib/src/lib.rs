// ============================
// polifinder-backend-lib/src/lib.rs
// ============================
//! Core library for the politician-finder API server.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod moderation;
pub mod rate_limit;
pub mod response;
pub mod router;
pub mod telemetry;
pub mod validation;

use std::sync::Arc;

use metrics::{counter, gauge};
use tracing::warn;

use crate::backend::BackendClient;
use crate::config::Settings;
use crate::error::AppError;
use crate::rate_limit::{RateLimitDecision, RateLimiter};
use crate::telemetry::keys;

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth, profile and storage capabilities
    pub backend: Arc<dyn BackendClient>,
    /// Loaded configuration
    pub settings: Arc<Settings>,
    /// Per-identity request counters
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(backend: Arc<dyn BackendClient>, settings: Settings) -> Self {
        Self {
            backend,
            settings: Arc::new(settings),
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }

    /// Build the state with whichever backend `settings` selects
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let backend = backend::connect(&settings).await?;
        Ok(Self::new(backend, settings))
    }

    /// Count one request from `identity` against the named rule.
    ///
    /// Rules missing from the configuration never limit.
    pub fn enforce_rate_limit(&self, identity: &str, rule_name: &str) -> Result<(), AppError> {
        let Some(rule) = self.settings.rule(rule_name) else {
            return Ok(());
        };

        match self.rate_limiter.check_and_consume(identity, rule_name, rule) {
            RateLimitDecision::Allowed { .. } => Ok(()),
            RateLimitDecision::Limited { retry_after } => {
                counter!(keys::RATE_LIMITED, "rule" => rule_name.to_string()).increment(1);
                warn!(identity, rule = rule_name, ?retry_after, "rate limit exceeded");
                Err(AppError::RateLimited { retry_after })
            }
        }
    }

    /// Drop expired rate-limit windows
    pub fn sweep_rate_limits(&self) {
        self.rate_limiter.cleanup();
        gauge!(keys::RATE_LIMIT_KEYS).set(self.rate_limiter.len() as f64);
    }
}
