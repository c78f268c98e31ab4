// ============================
// polifinder-backend-lib/src/backend/storage.rs
// ============================
//! Attachment storage abstraction with flat-file implementation.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs as tokio_fs;
use uuid::Uuid;

use super::{BackendError, BackendResult};
use crate::validation::sanitize_file_name;
use polifinder_common::UserId;

/// Directory under `data_dir` holding locally stored attachments
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Trait for attachment storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `bytes` for `user_id`; returns the path relative to the storage root
    async fn store_attachment(
        &self,
        user_id: UserId,
        file_name: &str,
        bytes: &[u8],
    ) -> BackendResult<String>;

    /// Remove every attachment owned by `user_id`
    async fn remove_user_attachments(&self, user_id: UserId) -> BackendResult<()>;
}

/// Flat-file implementation of the Storage trait
#[derive(Clone, Debug)]
pub struct FlatFileStorage {
    root: PathBuf,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn io_error(err: std::io::Error) -> BackendError {
    BackendError::Storage(format!("attachment storage failed: {err}"))
}

#[async_trait]
impl Storage for FlatFileStorage {
    async fn store_attachment(
        &self,
        user_id: UserId,
        file_name: &str,
        bytes: &[u8],
    ) -> BackendResult<String> {
        let user_dir = self.root.join(user_id.to_string());
        tokio_fs::create_dir_all(&user_dir).await.map_err(io_error)?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name));
        let path = user_dir.join(&stored_name);

        // create_new so two uploads can never clobber each other
        let mut file = tokio_fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    BackendError::Conflict("attachment already exists".to_string())
                }
                _ => io_error(e),
            })?;
        tokio::io::AsyncWriteExt::write_all(&mut file, bytes)
            .await
            .map_err(io_error)?;
        tokio::io::AsyncWriteExt::flush(&mut file)
            .await
            .map_err(io_error)?;

        Ok(format!("{user_id}/{stored_name}"))
    }

    async fn remove_user_attachments(&self, user_id: UserId) -> BackendResult<()> {
        let user_dir = self.root.join(user_id.to_string());
        match tokio_fs::remove_dir_all(&user_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}
