// ============================
// polifinder-backend-lib/src/backend/mod.rs
// ============================
//! Capability interface over the managed auth/storage service.
//!
//! Handlers only ever see [`BackendClient`]; which implementation sits behind
//! it is decided once, from configuration, in [`connect`].

pub mod memory;
pub mod storage;
pub mod supabase;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use polifinder_common::{ProfileRecord, ProfileUpdate, Session, User, UserId};
use thiserror::Error;

use crate::config::{BackendSettings, Settings};

pub use memory::InMemoryBackend;
pub use storage::{FlatFileStorage, Storage, ATTACHMENTS_DIR};
pub use supabase::SupabaseBackend;

/// Errors surfaced by a backend, already reduced to the kinds handlers map
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{0}")]
    AuthFailed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    Unknown(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// A file received from a client, already validated
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Check credentials and open a session
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session>;

    /// Close the session identified by `access_token`
    async fn sign_out(&self, access_token: &str) -> BackendResult<()>;

    /// Resolve the user behind `access_token`
    async fn get_current_user(&self, access_token: &str) -> BackendResult<User>;

    /// Trade a refresh token for a new session
    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<Session>;

    /// Send a password-reset link to `email`
    async fn request_password_reset(&self, email: &str, redirect_to: Option<&str>) -> BackendResult<()>;

    /// Set a new password for the user behind `access_token`
    async fn update_password(&self, access_token: &str, new_password: &str) -> BackendResult<()>;

    async fn get_profile(&self, user_id: UserId) -> BackendResult<ProfileRecord>;

    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> BackendResult<ProfileRecord>;

    /// Remove the account and everything attached to it
    async fn delete_user(&self, user_id: UserId) -> BackendResult<()>;

    /// Store a file and return its public URL
    async fn upload_attachment(&self, user_id: UserId, upload: AttachmentUpload) -> BackendResult<String>;
}

/// Build the backend selected in `settings`
pub async fn connect(settings: &Settings) -> anyhow::Result<Arc<dyn BackendClient>> {
    match &settings.backend {
        BackendSettings::Memory {
            seed_users,
            scrypt_log_n,
        } => {
            let storage = FlatFileStorage::new(settings.data_dir.join(ATTACHMENTS_DIR))?;
            let backend = InMemoryBackend::new(
                storage,
                Duration::from_secs(settings.session_ttl_secs),
                settings.upload.public_base_url.clone(),
                *scrypt_log_n,
            );
            for seed in seed_users {
                let mut password = seed.password.clone();
                backend
                    .create_account(&seed.email, &mut password, seed.display_name.clone())
                    .await?;
            }
            tracing::info!(seeded = seed_users.len(), "using in-process backend");
            Ok(Arc::new(backend))
        }
        BackendSettings::Supabase {
            url,
            anon_key,
            service_role_key,
            timeout_secs,
        } => {
            let backend = SupabaseBackend::new(
                url,
                anon_key.clone(),
                service_role_key.clone(),
                settings.upload.bucket.clone(),
                Duration::from_secs(*timeout_secs),
            )?;
            tracing::info!(url = %url, "using managed backend");
            Ok(Arc::new(backend))
        }
    }
}
