// ============================
// polifinder-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::rate_limit::RateLimitRule;

/// Environment variable prefix; nested keys are split on `__`
pub const ENV_PREFIX: &str = "POLIFINDER_";

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Largest attachment size the server can be configured to accept (1 GiB)
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Session TTL in seconds
    pub session_ttl_secs: u64,
    /// Password requirements
    pub password_requirements: PasswordRequirements,
    /// Profile field limits
    pub profile_limits: ProfileLimits,
    /// Attachment upload settings
    pub upload: UploadSettings,
    /// Rate limit rules
    pub rate_limit: RateLimitSettings,
    /// Which managed backend to talk to
    pub backend: BackendSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Password complexity requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    /// Minimum password length
    pub min_length: usize,
    /// Require uppercase letters
    pub require_uppercase: bool,
    /// Require lowercase letters
    pub require_lowercase: bool,
    /// Require digits
    pub require_digit: bool,
    /// Require special characters
    pub require_special: bool,
}

/// Upper bounds on profile fields, in characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLimits {
    pub max_display_name: usize,
    pub max_bio: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Largest accepted attachment in bytes
    pub max_bytes: usize,
    pub allowed_content_types: Vec<String>,
    /// Storage bucket on the managed backend
    pub bucket: String,
    /// Prefix for URLs of locally stored attachments
    pub public_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// How often expired windows are swept
    pub cleanup_interval_secs: u64,
    /// Rules by name; a name without a rule is unlimited
    pub rules: HashMap<String, RateLimitRule>,
    /// Reverse proxies whose `X-Forwarded-For` / `X-Real-IP` are believed.
    /// Empty means callers are keyed on their socket address only.
    pub trusted_proxies: Vec<IpAddr>,
}

/// Managed backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendSettings {
    /// In-process backend for local development and tests
    Memory {
        #[serde(default)]
        seed_users: Vec<SeedUser>,
        /// scrypt cost parameter (log2 N)
        #[serde(default = "default_scrypt_log_n")]
        scrypt_log_n: u8,
    },
    /// Supabase-style managed service
    Supabase {
        url: String,
        anon_key: String,
        service_role_key: String,
        #[serde(default = "default_backend_timeout")]
        timeout_secs: u64,
    },
}

/// Account created by the in-process backend at startup
#[derive(Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl std::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

fn default_scrypt_log_n() -> u8 {
    15
}

fn default_backend_timeout() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            session_ttl_secs: 60 * 60, // 1 hour
            password_requirements: PasswordRequirements::default(),
            profile_limits: ProfileLimits::default(),
            upload: UploadSettings::default(),
            rate_limit: RateLimitSettings::default(),
            backend: BackendSettings::default(),
        }
    }
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 10,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl Default for ProfileLimits {
    fn default() -> Self {
        Self {
            max_display_name: 80,
            max_bio: 500,
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
                "application/pdf".to_string(),
            ],
            bucket: "attachments".to_string(),
            public_base_url: "/files".to_string(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let rules = [
            ("global", RateLimitRule::new(300, 60)),
            ("login", RateLimitRule::new(5, 60)),
            ("refresh", RateLimitRule::new(30, 60)),
            ("reset_password", RateLimitRule::new(3, 15 * 60)),
            ("update_password", RateLimitRule::new(5, 15 * 60)),
            ("profile_update", RateLimitRule::new(20, 60)),
            ("delete_account", RateLimitRule::new(3, 60 * 60)),
            ("upload", RateLimitRule::new(10, 60)),
            ("moderation", RateLimitRule::new(60, 60)),
        ]
        .into_iter()
        .map(|(name, rule)| (name.to_string(), rule))
        .collect();

        Self {
            cleanup_interval_secs: 5 * 60,
            rules,
            trusted_proxies: Vec::new(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings::Memory {
            seed_users: Vec::new(),
            scrypt_log_n: default_scrypt_log_n(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional TOML file and the environment.
    ///
    /// A missing file is not an error; values in it override the defaults and
    /// `POLIFINDER_*` variables override both.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::figment(path).extract().map_err(Into::into)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Look up a rate-limit rule by name
    pub fn rule(&self, name: &str) -> Option<&RateLimitRule> {
        self.rate_limit.rules.get(name)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.session_ttl_secs == 0 {
            bail!("session_ttl_secs must be greater than zero");
        }
        if self.password_requirements.min_length < 8 {
            bail!("password_requirements.min_length must be at least 8");
        }
        if self.profile_limits.max_display_name == 0 || self.profile_limits.max_bio == 0 {
            bail!("profile limits must be greater than zero");
        }
        if self.upload.max_bytes == 0 || self.upload.max_bytes > MAX_UPLOAD_BYTES {
            bail!("upload.max_bytes must be between 1 and {MAX_UPLOAD_BYTES}");
        }
        if self.upload.allowed_content_types.is_empty() {
            bail!("upload.allowed_content_types must not be empty");
        }
        if self.rate_limit.cleanup_interval_secs == 0 {
            bail!("rate_limit.cleanup_interval_secs must be greater than zero");
        }
        for (name, rule) in &self.rate_limit.rules {
            if rule.max_requests == 0 || rule.window_secs == 0 {
                bail!("rate limit rule '{name}' must allow at least one request per non-empty window");
            }
        }
        match &self.backend {
            BackendSettings::Memory { scrypt_log_n, .. } => {
                if !(1..=20).contains(scrypt_log_n) {
                    bail!("backend.scrypt_log_n must be between 1 and 20");
                }
            }
            BackendSettings::Supabase {
                url,
                anon_key,
                service_role_key,
                timeout_secs,
            } => {
                let parsed = url::Url::parse(url)
                    .map_err(|e| anyhow::anyhow!("backend.url is not a valid URL: {e}"))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    bail!("backend.url must use http or https");
                }
                if anon_key.is_empty() || service_role_key.is_empty() {
                    bail!("backend keys must not be empty");
                }
                if *timeout_secs == 0 {
                    bail!("backend.timeout_secs must be greater than zero");
                }
            }
        }
        Ok(())
    }
}
