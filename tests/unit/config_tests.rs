// ==========================
// tests/unit/config_tests.rs
// ==========================
//! Unit tests for the configuration module
use polifinder_backend_lib::config::{BackendSettings, LogFormat, Settings};
use polifinder_backend_lib::rate_limit::RateLimitRule;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.log_format, LogFormat::Pretty);
    assert_eq!(settings.session_ttl_secs, 3600);
    assert_eq!(settings.rule("login"), Some(&RateLimitRule::new(5, 60)));
    assert_eq!(settings.rule("reset_password"), Some(&RateLimitRule::new(3, 900)));
    assert!(matches!(settings.backend, BackendSettings::Memory { .. }));
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("polifinder.toml");
    fs::write(
        &path,
        r#"
            bind_addr = "0.0.0.0:9000"
            log_format = "json"

            [rate_limit.rules.login]
            max_requests = 10
            window_secs = 30

            [backend]
            kind = "supabase"
            url = "https://project.supabase.example"
            anon_key = "anon"
            service_role_key = "service"
        "#,
    )
    .unwrap();

    let settings = Settings::load(Some(&path)).unwrap();
    assert_eq!(settings.bind_addr.port(), 9000);
    assert_eq!(settings.log_format, LogFormat::Json);
    assert_eq!(settings.rule("login"), Some(&RateLimitRule::new(10, 30)));
    // rules not in the file keep their defaults
    assert_eq!(settings.rule("upload"), Some(&RateLimitRule::new(10, 60)));
    match &settings.backend {
        BackendSettings::Supabase { url, timeout_secs, .. } => {
            assert_eq!(url, "https://project.supabase.example");
            assert_eq!(*timeout_secs, 10);
        }
        other => panic!("expected supabase backend, got {other:?}"),
    }
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_missing_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let settings = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(settings.profile_limits.max_bio, 500);
}

#[test]
fn test_settings_validation_rejects_bad_values() {
    let mut settings = Settings::default();
    settings
        .rate_limit
        .rules
        .insert("login".to_string(), RateLimitRule::new(0, 60));
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.password_requirements.min_length = 4;
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.log_level = "loud".to_string();
    assert!(settings.validate().is_err());
}
