// ==================================
// tests/integration/auth_flow_tests.rs
// ==================================
//! Login, logout, refresh and password flows through the router.
use axum::http::{Method, StatusCode};
use serde_json::json;

use polifinder_backend_lib::config::{BackendSettings, SeedUser};

use crate::test_utils::{setup_test_app, setup_test_app_with, USER_EMAIL, USER_PASSWORD};

#[tokio::test]
async fn test_health() {
    let app = setup_test_app().await;
    let response = app.empty(Method::GET, "/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "success": true, "data": { "status": "ok" } }));
}

#[tokio::test]
async fn test_login_success_returns_session() {
    let app = setup_test_app().await;
    let response = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": USER_EMAIL, "password": USER_PASSWORD }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    let session = &response.body["data"]["session"];
    assert!(session["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(session["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(response.body.get("error").is_none());
}

#[tokio::test]
async fn test_login_wrong_password_is_auth_failed() {
    let app = setup_test_app_with(|settings| {
        if let BackendSettings::Memory { seed_users, .. } = &mut settings.backend {
            seed_users.push(SeedUser {
                email: "a@b.com".to_string(),
                password: "C0rrect-Horse!".to_string(),
                display_name: None,
            });
        }
    })
    .await;
    let response = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": "a@b.com", "password": "wrong" }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"]["code"], "AuthFailed");
    assert!(response.body.get("data").is_none());
    assert_eq!(app.backend.calls(), 1);

    let correct = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": "a@b.com", "password": "C0rrect-Horse!" }),
            None,
        )
        .await;
    assert_eq!(correct.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let app = setup_test_app().await;
    let unknown = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": "nobody@example.com", "password": "wrong" }),
            None,
        )
        .await;
    let wrong = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": USER_EMAIL, "password": "wrong" }),
            None,
        )
        .await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body, wrong.body);
}

#[tokio::test]
async fn test_login_invalid_email_never_reaches_backend() {
    let app = setup_test_app().await;
    let response = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": "not-an-email", "password": USER_PASSWORD }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["code"], "ValidationError");
    assert_eq!(app.backend.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let app = setup_test_app().await;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["code"], "ValidationError");
}

#[tokio::test]
async fn test_profile_requires_bearer_token() {
    let app = setup_test_app().await;
    let response = app.empty(Method::GET, "/auth/profile", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"]["message"], "Unauthorized");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = setup_test_app().await;
    let session = app.login().await;

    let profile = app
        .empty(Method::GET, "/auth/profile", Some(&session.access_token))
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["data"]["user"]["email"], USER_EMAIL);

    let logout = app
        .empty(Method::POST, "/auth/logout", Some(&session.access_token))
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["data"]["message"], "Logged out");

    let after = app
        .empty(Method::GET, "/auth/profile", Some(&session.access_token))
        .await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    assert_eq!(after.body["error"]["code"], "AuthFailed");
}

#[tokio::test]
async fn test_refresh_token_is_single_use() {
    let app = setup_test_app().await;
    let session = app.login().await;

    let first = app
        .json(
            Method::POST,
            "/auth/refresh",
            json!({ "refreshToken": session.refresh_token }),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let renewed = &first.body["data"]["session"];
    assert_ne!(renewed["access_token"], session.access_token.as_str());

    let replay = app
        .json(
            Method::POST,
            "/auth/refresh",
            json!({ "refreshToken": session.refresh_token }),
            None,
        )
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    // the access token from before the rotation is gone too
    let old = app
        .empty(Method::GET, "/auth/profile", Some(&session.access_token))
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_blank_token_is_validation_error() {
    let app = setup_test_app().await;
    let response = app
        .json(Method::POST, "/auth/refresh", json!({ "refreshToken": "" }), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.backend.calls(), 0);
}

#[tokio::test]
async fn test_reset_password_does_not_reveal_accounts() {
    let app = setup_test_app().await;

    let known = app
        .json(
            Method::POST,
            "/auth/reset-password",
            json!({ "email": USER_EMAIL, "redirectTo": "https://politicians.example/reset" }),
            None,
        )
        .await;
    let unknown = app
        .json(
            Method::POST,
            "/auth/reset-password",
            json!({ "email": "nobody@example.com" }),
            None,
        )
        .await;

    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(known.body, unknown.body);
}

#[tokio::test]
async fn test_update_password_enforces_strength() {
    let app = setup_test_app().await;
    let session = app.login().await;

    let weak = app
        .json(
            Method::POST,
            "/auth/update-password",
            json!({ "password": "password" }),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
    assert_eq!(weak.body["error"]["code"], "ValidationError");

    let strong = app
        .json(
            Method::POST,
            "/auth/update-password",
            json!({ "password": "An0ther-Str0ng-One" }),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(strong.status, StatusCode::OK);

    let old = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": USER_EMAIL, "password": USER_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": USER_EMAIL, "password": "An0ther-Str0ng-One" }),
            None,
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);
}
