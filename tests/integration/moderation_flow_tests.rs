use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::test_utils::setup_test_app;

#[tokio::test]
async fn test_moderation_check_scores_content() {
    let app = setup_test_app().await;

    let clean = app
        .json(
            Method::POST,
            "/moderation/check",
            json!({ "content": "Town hall meeting on Thursday at 7pm." }),
            None,
        )
        .await;
    assert_eq!(clean.status, StatusCode::OK);
    assert_eq!(clean.body["data"]["action"], "allow");
    assert_eq!(clean.body["data"]["score"], 0.0);

    let violent = app
        .json(
            Method::POST,
            "/moderation/check",
            json!({ "content": "I will kill the senator" }),
            None,
        )
        .await;
    assert_eq!(violent.status, StatusCode::OK);
    assert_eq!(violent.body["data"]["action"], "remove");
    assert_eq!(violent.body["data"]["categories"], json!(["violence"]));
}

#[tokio::test]
async fn test_moderation_rejects_empty_content() {
    let app = setup_test_app().await;
    let response = app
        .json(Method::POST, "/moderation/check", json!({ "content": "  " }), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
