// =========================
// tests/unit/error_tests.rs
// =========================
//! Unit tests for the error module
use axum::http::StatusCode;
use axum::response::IntoResponse;
use polifinder_backend_lib::backend::BackendError;
use polifinder_backend_lib::error::AppError;
use polifinder_backend_lib::validation::ValidationError;
use std::time::Duration;

#[test]
fn test_app_error_display() {
    let auth_error = AppError::AuthFailed("Invalid login credentials".to_string());
    assert_eq!(auth_error.to_string(), "Invalid login credentials");

    let validation = AppError::from(ValidationError::InvalidEmail("Invalid email format".to_string()));
    assert!(validation.to_string().contains("Invalid email format"));
}

#[test]
fn test_error_codes_and_statuses() {
    let cases = [
        (AppError::InvalidRequest("bad".into()), "ValidationError", StatusCode::BAD_REQUEST),
        (
            AppError::RateLimited { retry_after: Duration::from_secs(3) },
            "RateLimited",
            StatusCode::TOO_MANY_REQUESTS,
        ),
        (AppError::from(BackendError::AuthFailed("x".into())), "AuthFailed", StatusCode::UNAUTHORIZED),
        (AppError::from(BackendError::NotFound("x".into())), "NotFound", StatusCode::NOT_FOUND),
        (AppError::from(BackendError::Conflict("x".into())), "Conflict", StatusCode::CONFLICT),
        (
            AppError::from(BackendError::Storage("x".into())),
            "StorageError",
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            AppError::from(BackendError::Unknown("x".into())),
            "Unknown",
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, code, status) in cases {
        assert_eq!(error.error_code(), code);
        assert_eq!(error.status_code(), status);
    }
}

#[tokio::test]
async fn test_unknown_error_message_is_sanitized() {
    let response = AppError::Unknown("panic in sqlx pool at db.internal".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "Unknown");
    assert!(!body["error"]["message"].as_str().unwrap().contains("db.internal"));
    assert!(body["error"].get("retry_after").is_none());
}
