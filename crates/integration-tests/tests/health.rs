//! Health endpoint tests.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use visitmark_integration_tests::TestServer;

#[tokio::test]
async fn test_health_reports_loyalty_settings() {
    let server = TestServer::spawn(192, 0.35, 5).await;

    let resp = server.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "ok": true, "embedding_dim": 192, "match_threshold": 0.35, "reward_every": 5 })
    );
}

#[tokio::test]
async fn test_readiness_checks_database() {
    let server = TestServer::spawn_default().await;

    let resp = server.get("/health/ready").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::spawn_default().await;

    let resp = server
        .client
        .get(format!("{}/health", server.base_url))
        .header("x-request-id", "phone-42")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "phone-42");
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let server = TestServer::spawn_default().await;

    let resp = server.get("/rewards").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Not found");
}
