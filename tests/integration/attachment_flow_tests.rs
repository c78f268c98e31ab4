//! Multipart attachment uploads.
use axum::http::{Method, StatusCode};

use crate::test_utils::{multipart_request, setup_test_app};

#[tokio::test]
async fn test_upload_stores_file_and_serves_it() {
    let app = setup_test_app().await;
    let session = app.login().await;

    let response = app
        .send(multipart_request(
            Some(&session.access_token),
            "file",
            "campaign photo.png",
            "image/png",
            b"\x89PNG fake image",
        ))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let url = response.body["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with(&format!("/files/{}/", session.user_id)));
    assert!(url.ends_with("-campaign_photo.png"));

    let served = app.empty(Method::GET, &url, None).await;
    assert_eq!(served.status, StatusCode::OK);

    let relative = url.trim_start_matches("/files/");
    let on_disk = app.data_dir.path().join("attachments").join(relative);
    assert_eq!(std::fs::read(on_disk).unwrap(), b"\x89PNG fake image");
}

#[tokio::test]
async fn test_disallowed_content_type_is_rejected() {
    let app = setup_test_app().await;
    let session = app.login().await;

    let response = app
        .send(multipart_request(
            Some(&session.access_token),
            "file",
            "run.sh",
            "application/x-sh",
            b"#!/bin/sh",
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["code"], "ValidationError");
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() {
    let app = setup_test_app().await;
    let session = app.login().await;

    let response = app
        .send(multipart_request(
            Some(&session.access_token),
            "avatar",
            "photo.png",
            "image/png",
            b"png",
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_requires_token() {
    let app = setup_test_app().await;
    let response = app
        .send(multipart_request(None, "file", "photo.png", "image/png", b"png"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
