//! Rate limiting as seen by clients.
use axum::http::{header, Method, StatusCode};
use futures_util::future::join_all;
use polifinder_backend_lib::rate_limit::RateLimitRule;
use serde_json::json;

use crate::test_utils::{json_request, setup_test_app, setup_test_app_with, USER_EMAIL};

fn bad_login() -> serde_json::Value {
    json!({ "email": USER_EMAIL, "password": "wrong-password" })
}

#[tokio::test]
async fn test_sixth_login_in_window_is_rate_limited() {
    let app = setup_test_app().await;

    for _ in 0..5 {
        let response = app
            .send(json_request(Method::POST, "/auth/login", bad_login(), None, Some("203.0.113.5")))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let calls_before = app.backend.calls();
    let limited = app
        .send(json_request(Method::POST, "/auth/login", bad_login(), None, Some("203.0.113.5")))
        .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"]["code"], "RateLimited");

    let retry_after = limited.body["error"]["retry_after"].as_u64().unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(
        limited.headers[header::RETRY_AFTER].to_str().unwrap(),
        retry_after.to_string()
    );
    assert_eq!(app.backend.calls(), calls_before);

    // another client keeps its own budget
    let other = app
        .send(json_request(Method::POST, "/auth/login", bad_login(), None, Some("198.51.100.9")))
        .await;
    assert_eq!(other.status, StatusCode::UNAUTHORIZED);
}

fn forwarded_login(peer_ip: &str, forwarded_for: &str) -> axum::http::Request<axum::body::Body> {
    let mut request = json_request(Method::POST, "/auth/login", bad_login(), None, Some(peer_ip));
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    request
}

#[tokio::test]
async fn test_forwarded_for_rotation_does_not_reset_login_budget() {
    let app = setup_test_app().await;

    let mut limited = 0;
    for i in 0..20 {
        let response = app
            .send(forwarded_login("203.0.113.20", &format!("10.9.9.{i}")))
            .await;
        if response.status == StatusCode::TOO_MANY_REQUESTS {
            limited += 1;
        }
    }

    assert_eq!(limited, 15);
    assert_eq!(app.backend.calls(), 5);
}

#[tokio::test]
async fn test_trusted_proxy_forwards_client_address() {
    let app = setup_test_app_with(|settings| {
        settings.rate_limit.trusted_proxies = vec!["10.0.0.1".parse().unwrap()];
    })
    .await;

    for _ in 0..5 {
        let response = app.send(forwarded_login("10.0.0.1", "198.51.100.1")).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    // a hop the client wrote itself does not buy a new budget
    let spoofed = app
        .send(forwarded_login("10.0.0.1", "192.0.2.200, 198.51.100.1"))
        .await;
    assert_eq!(spoofed.status, StatusCode::TOO_MANY_REQUESTS);

    let other = app.send(forwarded_login("10.0.0.1", "198.51.100.2")).await;
    assert_eq!(other.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_logins_never_exceed_budget() {
    let app = setup_test_app().await;

    let responses = join_all((0..12).map(|_| {
        app.send(json_request(Method::POST, "/auth/login", bad_login(), None, Some("192.0.2.44")))
    }))
    .await;

    let limited = responses
        .iter()
        .filter(|r| r.status == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(limited, 7);
}

#[tokio::test]
async fn test_global_rule_applies_to_every_route() {
    let app = setup_test_app_with(|settings| {
        settings
            .rate_limit
            .rules
            .insert("global".to_string(), RateLimitRule::new(2, 60));
    })
    .await;

    assert_eq!(app.empty(Method::GET, "/health", None).await.status, StatusCode::OK);
    assert_eq!(app.empty(Method::GET, "/health", None).await.status, StatusCode::OK);
    let third = app.empty(Method::GET, "/health", None).await;
    assert_eq!(third.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(third.headers.contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn test_unconfigured_rule_is_unlimited() {
    let app = setup_test_app_with(|settings| {
        settings.rate_limit.rules.remove("moderation");
    })
    .await;

    for _ in 0..100 {
        let response = app
            .json(Method::POST, "/moderation/check", json!({ "content": "hello" }), None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }
}
