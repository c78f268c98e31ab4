// ============================
// polifinder-backend-lib/src/backend/supabase.rs
// ============================
//! Adapter for a hosted GoTrue / PostgREST / Storage deployment.
//!
//! Every remote failure is folded into a [`BackendError`] here; nothing
//! transport-specific leaks past this module.
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use polifinder_common::{ProfileRecord, ProfileUpdate, Session, User, UserId};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use super::{AttachmentUpload, BackendClient, BackendError, BackendResult};
use crate::validation::sanitize_file_name;

/// Which call is being mapped; sign-in and refresh treat a 400 as bad credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Credentials,
    Other,
}

/// Fold a non-success status into an error kind
fn map_status(status: StatusCode, kind: CallKind, detail: String) -> BackendError {
    match status.as_u16() {
        400 if kind == CallKind::Credentials => BackendError::AuthFailed(detail),
        401 | 403 => BackendError::AuthFailed(detail),
        404 => BackendError::NotFound(detail),
        409 => BackendError::Conflict(detail),
        500..=599 => BackendError::Storage(detail),
        _ => BackendError::Unknown(detail),
    }
}

fn map_transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        BackendError::Storage(format!("backend unreachable: {err}"))
    } else if err.is_decode() {
        BackendError::Unknown(format!("unexpected backend response: {err}"))
    } else {
        BackendError::Unknown(format!("backend request failed: {err}"))
    }
}

/// Pull the human-readable message out of a GoTrue/PostgREST error body
fn error_detail(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error_description: Option<String>,
        msg: Option<String>,
        message: Option<String>,
        error: Option<String>,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|p| p.error_description.or(p.msg).or(p.message).or(p.error))
        .unwrap_or_else(|| format!("backend returned {status}"))
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<RemoteUser> for User {
    fn from(remote: RemoteUser) -> Self {
        User {
            id: remote.id,
            email: remote.email.unwrap_or_default(),
            created_at: remote.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    user: RemoteUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            user_id: self.user.id,
            issued_at: now,
            expires_at: now + TimeDelta::seconds(self.expires_in.max(0)),
        }
    }
}

/// Profile row as stored in the `profiles` table
#[derive(Debug, Deserialize, Serialize)]
struct ProfileRow {
    id: Uuid,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    contact_email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<ProfileRow> for ProfileRecord {
    fn from(row: ProfileRow) -> Self {
        ProfileRecord {
            id: row.id,
            display_name: row.display_name,
            bio: row.bio,
            contact_email: row.contact_email,
            phone: row.phone,
            website: row.website,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct SupabaseBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
    bucket: String,
}

impl std::fmt::Debug for SupabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseBackend")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl SupabaseBackend {
    pub fn new(
        base_url: &str,
        anon_key: String,
        service_role_key: String,
        bucket: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("backend url must be http(s), got {}", parsed.scheme());
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            service_role_key,
            bucket,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request authorised as the end user
    fn as_user(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }

    /// Request authorised with the anon key only
    fn as_anon(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Request authorised with the service-role key
    fn as_service(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn send(&self, builder: RequestBuilder, kind: CallKind) -> BackendResult<Response> {
        let response = builder.send().await.map_err(map_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(status, &body);
        if status.is_server_error() {
            error!(%status, %detail, "backend call failed");
        } else {
            debug!(%status, %detail, "backend call rejected");
        }
        Err(map_status(status, kind, detail))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, kind: CallKind) -> BackendResult<T> {
        self.send(builder, kind)
            .await?
            .json::<T>()
            .await
            .map_err(map_transport)
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> BackendResult<Session> {
        let url = self.endpoint(&format!("/auth/v1/token?grant_type={grant_type}"));
        let request = self.as_anon(self.client.post(url)).json(&body);
        let token: TokenResponse = self.send_json(request, CallKind::Credentials).await?;
        Ok(token.into_session(Utc::now()))
    }

    fn profile_url(&self, user_id: UserId) -> String {
        self.endpoint(&format!("/rest/v1/profiles?id=eq.{user_id}"))
    }

    fn first_profile(rows: Vec<ProfileRow>) -> BackendResult<ProfileRecord> {
        rows.into_iter()
            .next()
            .map(ProfileRecord::from)
            .ok_or_else(|| BackendError::NotFound("Profile not found".to_string()))
    }
}

#[async_trait]
impl BackendClient for SupabaseBackend {
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        let request = self.as_user(self.client.post(self.endpoint("/auth/v1/logout")), access_token);
        self.send(request, CallKind::Other).await?;
        Ok(())
    }

    async fn get_current_user(&self, access_token: &str) -> BackendResult<User> {
        let request = self.as_user(self.client.get(self.endpoint("/auth/v1/user")), access_token);
        let user: RemoteUser = self.send_json(request, CallKind::Other).await?;
        Ok(user.into())
    }

    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<Session> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn request_password_reset(&self, email: &str, redirect_to: Option<&str>) -> BackendResult<()> {
        let mut url = self.endpoint("/auth/v1/recover");
        if let Some(redirect) = redirect_to {
            let mut parsed = Url::parse(&url)
                .map_err(|e| BackendError::Unknown(format!("invalid recover url: {e}")))?;
            parsed.query_pairs_mut().append_pair("redirect_to", redirect);
            url = parsed.to_string();
        }
        let request = self.as_anon(self.client.post(url)).json(&json!({ "email": email }));
        self.send(request, CallKind::Other).await?;
        Ok(())
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> BackendResult<()> {
        let request = self
            .as_user(self.client.put(self.endpoint("/auth/v1/user")), access_token)
            .json(&json!({ "password": new_password }));
        self.send(request, CallKind::Other).await?;
        Ok(())
    }

    async fn get_profile(&self, user_id: UserId) -> BackendResult<ProfileRecord> {
        let request = self.as_service(self.client.get(self.profile_url(user_id)));
        let rows: Vec<ProfileRow> = self.send_json(request, CallKind::Other).await?;
        Self::first_profile(rows)
    }

    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> BackendResult<ProfileRecord> {
        let mut patch = serde_json::to_value(update)
            .map_err(|e| BackendError::Unknown(format!("profile encoding failed: {e}")))?;
        if let Some(fields) = patch.as_object_mut() {
            fields.retain(|_, v| !v.is_null());
            fields.insert("updated_at".to_string(), json!(Utc::now()));
        }

        let request = self
            .as_service(self.client.patch(self.profile_url(user_id)))
            .header("Prefer", "return=representation")
            .json(&patch);
        let rows: Vec<ProfileRow> = self.send_json(request, CallKind::Other).await?;
        Self::first_profile(rows)
    }

    async fn delete_user(&self, user_id: UserId) -> BackendResult<()> {
        let request = self.as_service(
            self.client
                .delete(self.endpoint(&format!("/auth/v1/admin/users/{user_id}"))),
        );
        self.send(request, CallKind::Other).await?;
        Ok(())
    }

    async fn upload_attachment(&self, user_id: UserId, upload: AttachmentUpload) -> BackendResult<String> {
        let object_path = format!(
            "{user_id}/{}-{}",
            Uuid::new_v4(),
            sanitize_file_name(&upload.file_name)
        );
        let request = self
            .as_service(self.client.post(self.endpoint(&format!(
                "/storage/v1/object/{}/{object_path}",
                self.bucket
            ))))
            .header(reqwest::header::CONTENT_TYPE, upload.content_type)
            .header("x-upsert", "false")
            .body(upload.bytes);
        self.send(request, CallKind::Other).await?;

        Ok(self.endpoint(&format!(
            "/storage/v1/object/public/{}/{object_path}",
            self.bucket
        )))
    }
}
