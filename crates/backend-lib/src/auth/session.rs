// ============================
// polifinder-backend-lib/src/auth/session.rs
// ============================
//! Session token handling for the in-process backend.
use chrono::{DateTime, TimeDelta, Utc};
use metrics::{counter, gauge};
use polifinder_common::{Session, UserId};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;

use super::token_generator::generate_secure_token;
use crate::telemetry::keys;

/// Refresh tokens outlive the access token by this factor
const REFRESH_TTL_FACTOR: i32 = 24;

/// Longest access-token lifetime honoured
const MAX_TTL_DAYS: i64 = 365;

#[derive(Clone)]
struct RefreshGrant {
    access_token: String,
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct SessionTables {
    by_access: HashMap<String, Session>,
    by_refresh: HashMap<String, RefreshGrant>,
}

impl SessionTables {
    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.by_access.len();
        self.by_access.retain(|_, session| session.is_valid_at(now));
        self.by_refresh.retain(|_, grant| now < grant.expires_at);
        before - self.by_access.len()
    }
}

/// Session manager for handling authentication tokens
#[derive(Clone)]
pub struct SessionManager {
    tables: Arc<RwLock<SessionTables>>,
    ttl: TimeDelta,
}

impl SessionManager {
    /// Create a new session manager issuing sessions that live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        let ttl = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or_else(|| TimeDelta::days(MAX_TTL_DAYS))
            .min(TimeDelta::days(MAX_TTL_DAYS));
        Self {
            tables: Arc::new(RwLock::new(SessionTables::default())),
            ttl,
        }
    }

    /// Issue a new session for `user_id`
    pub async fn create_session(&self, user_id: UserId) -> Session {
        let now = Utc::now();
        let session = Session {
            access_token: generate_secure_token(),
            refresh_token: generate_secure_token(),
            token_type: "bearer".to_string(),
            user_id,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let mut tables = self.tables.write().await;
        let expired = tables.purge_expired(now);
        if expired > 0 {
            counter!(keys::SESSION_EXPIRED).increment(expired as u64);
        }

        tables.by_refresh.insert(
            session.refresh_token.clone(),
            RefreshGrant {
                access_token: session.access_token.clone(),
                user_id,
                expires_at: now + self.ttl * REFRESH_TTL_FACTOR,
            },
        );
        tables
            .by_access
            .insert(session.access_token.clone(), session.clone());

        counter!(keys::SESSION_CREATED).increment(1);
        gauge!(keys::SESSION_ACTIVE).set(tables.by_access.len() as f64);

        session
    }

    /// Get a session by access token if it has not expired
    pub async fn get_valid(&self, access_token: &str) -> Option<Session> {
        let tables = self.tables.read().await;
        tables
            .by_access
            .get(access_token)
            .filter(|session| session.is_valid_at(Utc::now()))
            .cloned()
    }

    /// Exchange a refresh token for a new session.
    ///
    /// The refresh token and the session it belonged to are consumed.
    pub async fn refresh(&self, refresh_token: &str) -> Option<Session> {
        let grant = {
            let mut tables = self.tables.write().await;
            let grant = tables.by_refresh.remove(refresh_token)?;
            tables.by_access.remove(&grant.access_token);
            grant
        };

        if Utc::now() >= grant.expires_at {
            return None;
        }
        Some(self.create_session(grant.user_id).await)
    }

    /// Invalidate one session; returns whether it existed
    pub async fn revoke(&self, access_token: &str) -> bool {
        let mut tables = self.tables.write().await;
        let removed = tables.by_access.remove(access_token).is_some();
        tables
            .by_refresh
            .retain(|_, grant| grant.access_token != access_token);
        gauge!(keys::SESSION_ACTIVE).set(tables.by_access.len() as f64);
        removed
    }

    /// Invalidate every session of `user_id`
    pub async fn revoke_user(&self, user_id: UserId) -> usize {
        let mut tables = self.tables.write().await;
        let before = tables.by_access.len();
        tables.by_access.retain(|_, session| session.user_id != user_id);
        tables.by_refresh.retain(|_, grant| grant.user_id != user_id);
        gauge!(keys::SESSION_ACTIVE).set(tables.by_access.len() as f64);
        before - tables.by_access.len()
    }

    /// Number of live sessions
    pub async fn active_count(&self) -> usize {
        self.tables.read().await.by_access.len()
    }
}
