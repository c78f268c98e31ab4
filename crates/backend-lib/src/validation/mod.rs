// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation module.
//!
//! Every check is a pure function returning the input on success or a
//! [`ValidationError`] naming the reason. Malformed input never panics.

use crate::config::{PasswordRequirements, ProfileLimits, UploadSettings};
use polifinder_common::ProfileUpdate;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_REFRESH_TOKEN_LENGTH: usize = 512;
const MAX_FILE_NAME_LENGTH: usize = 255;
const MAX_WEBSITE_LENGTH: usize = 2048;
const MAX_CONTENT_LENGTH: usize = 10_000;
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

// Regex patterns for validation
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static DISPLAY_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^<>/\\{}\[\];]*$").unwrap());
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[0-9 ()-]+$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid refresh token: {0}")]
    InvalidRefreshToken(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Invalid redirect: {0}")]
    InvalidRedirect(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a new password against the configured strength requirements
pub fn validate_password<'a>(
    password: &'a str,
    requirements: &PasswordRequirements,
) -> ValidationResult<&'a str> {
    let length = password.chars().count();
    if length < requirements.min_length {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {} characters",
            requirements.min_length
        )));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    let mut missing = Vec::new();
    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        missing.push("one uppercase letter");
    }
    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        missing.push("one lowercase letter");
    }
    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        missing.push("one number");
    }
    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        missing.push("one special character");
    }

    if !missing.is_empty() {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must contain at least {}",
            missing.join(", ")
        )));
    }

    Ok(password)
}

/// Validate a password presented at sign-in.
///
/// Strength rules apply when a password is set, not when it is used.
pub fn validate_credential(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password must not be empty".to_string(),
        ));
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(password)
}

/// Validate a refresh token
pub fn validate_refresh_token(token: &str) -> ValidationResult<&str> {
    if token.is_empty() {
        return Err(ValidationError::InvalidRefreshToken(
            "Refresh token must not be empty".to_string(),
        ));
    }

    if token.len() > MAX_REFRESH_TOKEN_LENGTH || token.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidRefreshToken(
            "Invalid refresh token format".to_string(),
        ));
    }

    Ok(token)
}

/// Trim surrounding whitespace from the display name so the stored value is the one checked
pub fn normalize_profile_update(update: &mut ProfileUpdate) {
    if let Some(name) = update.display_name.as_mut() {
        let trimmed = name.trim();
        if trimmed.len() != name.len() {
            *name = trimmed.to_string();
        }
    }
}

/// Validate a partial profile update
pub fn validate_profile_update(update: &ProfileUpdate, limits: &ProfileLimits) -> ValidationResult<()> {
    if update.is_empty() {
        return Err(ValidationError::InvalidProfile(
            "At least one field must be provided".to_string(),
        ));
    }

    if let Some(name) = &update.display_name {
        let length = name.trim().chars().count();
        if length == 0 || length > limits.max_display_name {
            return Err(ValidationError::InvalidProfile(format!(
                "Display name must be between 1 and {} characters",
                limits.max_display_name
            )));
        }
        if !DISPLAY_NAME_REGEX.is_match(name) || name.chars().any(char::is_control) {
            return Err(ValidationError::InvalidProfile(
                "Display name contains invalid characters".to_string(),
            ));
        }
    }

    if let Some(bio) = &update.bio {
        if bio.chars().count() > limits.max_bio {
            return Err(ValidationError::InvalidProfile(format!(
                "Bio cannot exceed {} characters",
                limits.max_bio
            )));
        }
    }

    if let Some(email) = &update.contact_email {
        validate_email(email).map_err(|_| {
            ValidationError::InvalidProfile("Contact email is not a valid address".to_string())
        })?;
    }

    if let Some(phone) = &update.phone {
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        if !PHONE_REGEX.is_match(phone) || !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
            return Err(ValidationError::InvalidProfile(
                "Phone number is not valid".to_string(),
            ));
        }
    }

    if let Some(website) = &update.website {
        validate_website(website)?;
    }

    Ok(())
}

fn is_http_url(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https") && parsed.has_host())
        .unwrap_or(false)
}

fn validate_website(website: &str) -> ValidationResult<&str> {
    if website.len() > MAX_WEBSITE_LENGTH {
        return Err(ValidationError::InvalidProfile(format!(
            "Website cannot exceed {MAX_WEBSITE_LENGTH} characters"
        )));
    }

    if !is_http_url(website) {
        return Err(ValidationError::InvalidProfile(
            "Website must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(website)
}

/// Validate where a password-reset link should send the user
pub fn validate_redirect(redirect: &str) -> ValidationResult<&str> {
    if redirect.len() > MAX_WEBSITE_LENGTH || !is_http_url(redirect) {
        return Err(ValidationError::InvalidRedirect(
            "Redirect must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(redirect)
}

/// Validate attachment metadata before anything is stored
pub fn validate_attachment(
    file_name: &str,
    content_type: &str,
    size: usize,
    settings: &UploadSettings,
) -> ValidationResult<()> {
    if file_name.trim().is_empty() {
        return Err(ValidationError::InvalidAttachment(
            "File name must not be empty".to_string(),
        ));
    }

    if file_name.len() > MAX_FILE_NAME_LENGTH {
        return Err(ValidationError::InvalidAttachment(format!(
            "File name cannot exceed {MAX_FILE_NAME_LENGTH} characters"
        )));
    }

    if !settings
        .allowed_content_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    {
        return Err(ValidationError::InvalidAttachment(format!(
            "Content type '{content_type}' is not allowed"
        )));
    }

    if size == 0 {
        return Err(ValidationError::InvalidAttachment(
            "File must not be empty".to_string(),
        ));
    }

    if size > settings.max_bytes {
        return Err(ValidationError::InvalidAttachment(format!(
            "File cannot exceed {} bytes",
            settings.max_bytes
        )));
    }

    Ok(())
}

/// Validate text submitted for moderation
pub fn validate_content(content: &str) -> ValidationResult<&str> {
    if content.trim().is_empty() {
        return Err(ValidationError::InvalidContent(
            "Content must not be empty".to_string(),
        ));
    }

    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(ValidationError::InvalidContent(format!(
            "Content cannot exceed {MAX_CONTENT_LENGTH} characters"
        )));
    }

    Ok(content)
}

/// Map a client-supplied file name onto a safe storage name
pub fn sanitize_file_name(file_name: &str) -> String {
    // only the last path segment counts
    let base = file_name
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(file_name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
