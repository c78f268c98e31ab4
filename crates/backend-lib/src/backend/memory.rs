// ============================
// polifinder-backend-lib/src/backend/memory.rs
// ============================
//! In-process backend: seeded accounts, scrypt password hashes, in-memory
//! sessions and profiles, attachments on the local filesystem.
//!
//! Used for local development and by the test-suite. Nothing but the
//! attachments survives a restart.
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use polifinder_common::{ProfileRecord, ProfileUpdate, Session, User, UserId};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroize;

use super::{AttachmentUpload, BackendClient, BackendError, BackendResult, Storage};
use crate::auth::{
    generate_secure_token, hash_password, hash_password_secure, verify_password, SessionManager,
};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const INVALID_SESSION: &str = "Invalid or expired session";

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl Account {
    fn to_user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            created_at: Some(self.created_at),
        }
    }
}

pub struct InMemoryBackend<S: Storage> {
    accounts: DashMap<UserId, Account>,
    /// Lower-cased email to account id
    emails: DashMap<String, UserId>,
    profiles: DashMap<UserId, ProfileRecord>,
    sessions: SessionManager,
    storage: S,
    public_base_url: String,
    scrypt_log_n: u8,
    /// Hash of a random secret, checked on unknown emails so they cost the same as known ones
    decoy_hash: OnceCell<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl<S: Storage> InMemoryBackend<S> {
    pub fn new(storage: S, session_ttl: Duration, public_base_url: String, scrypt_log_n: u8) -> Self {
        Self {
            accounts: DashMap::new(),
            emails: DashMap::new(),
            profiles: DashMap::new(),
            sessions: SessionManager::new(session_ttl),
            storage,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            scrypt_log_n,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Register an account; the plaintext password is zeroized afterwards
    pub async fn create_account(
        &self,
        email: &str,
        password: &mut String,
        display_name: Option<String>,
    ) -> BackendResult<UserId> {
        let key = normalize_email(email);
        if self.emails.contains_key(&key) {
            password.zeroize();
            return Err(BackendError::Conflict(format!("account {key} already exists")));
        }

        let mut plain = std::mem::take(password);
        let log_n = self.scrypt_log_n;
        let password_hash = tokio::task::spawn_blocking(move || hash_password_secure(&mut plain, log_n))
            .await
            .map_err(|e| BackendError::Unknown(format!("hashing task failed: {e}")))?
            .map_err(|e| BackendError::Unknown(format!("password hashing failed: {e}")))?;

        let id = Uuid::new_v4();
        match self.emails.entry(key.clone()) {
            Entry::Occupied(_) => {
                return Err(BackendError::Conflict(format!("account {key} already exists")));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        self.accounts.insert(
            id,
            Account {
                id,
                email: key,
                password_hash,
                created_at: Utc::now(),
            },
        );
        let mut profile = ProfileRecord::empty(id);
        profile.display_name = display_name;
        self.profiles.insert(id, profile);

        debug!(user_id = %id, "account created");
        Ok(id)
    }

    /// Number of sessions currently open
    pub async fn active_sessions(&self) -> usize {
        self.sessions.active_count().await
    }

    async fn decoy_hash(&self) -> BackendResult<String> {
        let log_n = self.scrypt_log_n;
        self.decoy_hash
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || hash_password(&generate_secure_token(), log_n))
                    .await
                    .map_err(|e| BackendError::Unknown(format!("hashing task failed: {e}")))
                    .and_then(|hashed| {
                        hashed.map_err(|e| BackendError::Unknown(format!("password hashing failed: {e}")))
                    })
            })
            .await
            .cloned()
    }

    async fn session_user(&self, access_token: &str) -> BackendResult<Account> {
        let session = self
            .sessions
            .get_valid(access_token)
            .await
            .ok_or_else(|| BackendError::AuthFailed(INVALID_SESSION.to_string()))?;
        self.accounts
            .get(&session.user_id)
            .map(|account| account.clone())
            .ok_or_else(|| BackendError::AuthFailed(INVALID_SESSION.to_string()))
    }
}

#[async_trait]
impl<S: Storage + 'static> BackendClient for InMemoryBackend<S> {
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        let account = self
            .emails
            .get(&normalize_email(email))
            .and_then(|id| self.accounts.get(id.value()).map(|a| a.clone()));

        let hash = match &account {
            Some(account) => account.password_hash.clone(),
            None => self.decoy_hash().await?,
        };
        let plain = password.to_string();
        let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &plain))
            .await
            .map_err(|e| BackendError::Unknown(format!("verification task failed: {e}")))?;

        match account {
            Some(account) if verified => Ok(self.sessions.create_session(account.id).await),
            _ => Err(BackendError::AuthFailed(INVALID_CREDENTIALS.to_string())),
        }
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        if self.sessions.revoke(access_token).await {
            Ok(())
        } else {
            Err(BackendError::AuthFailed(INVALID_SESSION.to_string()))
        }
    }

    async fn get_current_user(&self, access_token: &str) -> BackendResult<User> {
        Ok(self.session_user(access_token).await?.to_user())
    }

    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<Session> {
        let session = self
            .sessions
            .refresh(refresh_token)
            .await
            .ok_or_else(|| BackendError::AuthFailed("Invalid refresh token".to_string()))?;

        if !self.accounts.contains_key(&session.user_id) {
            self.sessions.revoke(&session.access_token).await;
            return Err(BackendError::AuthFailed("Invalid refresh token".to_string()));
        }
        Ok(session)
    }

    async fn request_password_reset(&self, email: &str, redirect_to: Option<&str>) -> BackendResult<()> {
        // Unknown addresses succeed too, so callers cannot discover accounts.
        if let Some(id) = self.emails.get(&normalize_email(email)) {
            info!(user_id = %id.value(), redirect_to = ?redirect_to, "password reset requested");
        }
        Ok(())
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> BackendResult<()> {
        let account = self.session_user(access_token).await?;

        let plain = new_password.to_string();
        let log_n = self.scrypt_log_n;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&plain, log_n))
            .await
            .map_err(|e| BackendError::Unknown(format!("hashing task failed: {e}")))?
            .map_err(|e| BackendError::Unknown(format!("password hashing failed: {e}")))?;

        match self.accounts.get_mut(&account.id) {
            Some(mut stored) => {
                stored.password_hash = password_hash;
                Ok(())
            }
            None => Err(BackendError::AuthFailed(INVALID_SESSION.to_string())),
        }
    }

    async fn get_profile(&self, user_id: UserId) -> BackendResult<ProfileRecord> {
        self.profiles
            .get(&user_id)
            .map(|profile| profile.clone())
            .ok_or_else(|| BackendError::NotFound("Profile not found".to_string()))
    }

    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> BackendResult<ProfileRecord> {
        let mut profile = self
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| BackendError::NotFound("Profile not found".to_string()))?;
        profile.apply(update);
        profile.updated_at = Some(Utc::now());
        Ok(profile.clone())
    }

    async fn delete_user(&self, user_id: UserId) -> BackendResult<()> {
        let (_, account) = self
            .accounts
            .remove(&user_id)
            .ok_or_else(|| BackendError::NotFound("User not found".to_string()))?;
        self.emails.remove(&account.email);
        self.profiles.remove(&user_id);
        let revoked = self.sessions.revoke_user(user_id).await;
        self.storage.remove_user_attachments(user_id).await?;

        info!(user_id = %user_id, revoked, "account deleted");
        Ok(())
    }

    async fn upload_attachment(&self, user_id: UserId, upload: AttachmentUpload) -> BackendResult<String> {
        if !self.accounts.contains_key(&user_id) {
            return Err(BackendError::NotFound("User not found".to_string()));
        }
        let relative = self
            .storage
            .store_attachment(user_id, &upload.file_name, &upload.bytes)
            .await?;
        Ok(format!("{}/{}", self.public_base_url, relative))
    }
}
