//! Attachment uploads for posts.
use std::sync::Arc;

use axum::extract::{
    multipart::{Multipart, MultipartRejection},
    State,
};
use metrics::counter;
use polifinder_common::AttachmentPayload;
use tracing::{debug, info, instrument};

use super::rules;
use crate::auth::BearerToken;
use crate::backend::AttachmentUpload;
use crate::error::AppError;
use crate::middleware::ClientIdentity;
use crate::response::ApiResponse;
use crate::telemetry::keys;
use crate::validation::{self, ValidationError};
use crate::AppState;

/// Multipart field carrying the file
pub const FILE_FIELD: &str = "file";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Pull the `file` field out of the form; other fields are skipped
async fn read_file_field(mut multipart: Multipart) -> Result<AttachmentUpload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "skipping multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = field.bytes().await?;
        return Ok(AttachmentUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(ValidationError::InvalidAttachment(format!("Missing '{FILE_FIELD}' field")).into())
}

#[instrument(skip_all, fields(client = %identity.as_str()))]
pub async fn upload_attachment(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    token: BearerToken,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<AttachmentPayload>, AppError> {
    let upload = read_file_field(multipart?).await?;
    validation::validate_attachment(
        &upload.file_name,
        &upload.content_type,
        upload.bytes.len(),
        &state.settings.upload,
    )?;

    state.enforce_rate_limit(identity.as_str(), rules::UPLOAD)?;

    let user = state.backend.get_current_user(token.as_str()).await?;
    let size = upload.bytes.len();
    let url = state.backend.upload_attachment(user.id, upload).await?;

    counter!(keys::UPLOADS).increment(1);
    counter!(keys::UPLOAD_BYTES).increment(size as u64);
    info!(user_id = %user.id, size, "attachment stored");
    Ok(ApiResponse::created(AttachmentPayload { url }))
}
