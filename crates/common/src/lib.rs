// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! shared between the Politician Finder API server and its clients.
//! This module defines the request bodies, response payloads and the
//! uniform response envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an authenticated actor
pub type UserId = Uuid;

/// Server-issued proof of authenticated identity with an expiry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token presented on authenticated requests
    pub access_token: String,
    /// Single-use token exchanged for a fresh session
    pub refresh_token: String,
    /// Always `bearer`
    pub token_type: String,
    /// Subject of the session
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is still usable at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Identity behind a session
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Public profile of a user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    /// An empty profile for a freshly created account
    pub fn empty(id: UserId) -> Self {
        Self {
            id,
            display_name: None,
            bio: None,
            contact_email: None,
            phone: None,
            website: None,
            updated_at: None,
        }
    }

    /// Copy every field present in `update` onto this record
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(v) = &update.display_name {
            self.display_name = Some(v.clone());
        }
        if let Some(v) = &update.bio {
            self.bio = Some(v.clone());
        }
        if let Some(v) = &update.contact_email {
            self.contact_email = Some(v.clone());
        }
        if let Some(v) = &update.phone {
            self.phone = Some(v.clone());
        }
        if let Some(v) = &update.website {
            self.website = Some(v.clone());
        }
    }
}

/// Partial profile update; absent fields are left untouched
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.bio.is_none()
            && self.contact_email.is_none()
            && self.phone.is_none()
            && self.website.is_none()
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    /// Where the reset link should land the user
    #[serde(default, alias = "redirect_to", skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModerationRequest {
    pub content: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionPayload {
    pub session: Session,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserPayload {
    pub user: User,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessagePayload {
    pub message: String,
}

impl MessagePayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeletedPayload {
    pub deleted: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPayload {
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthPayload {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Error details carried by a failed envelope
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    /// Stable error kind, e.g. `AuthFailed`
    pub code: String,
    pub message: String,
    /// Seconds until a rate-limited caller may retry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Uniform wrapper returned by every endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}
