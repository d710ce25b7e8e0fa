//! Customer listing and deletion tests.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::Value;
use visitmark_integration_tests::TestServer;

async fn list(server: &TestServer) -> Vec<Value> {
    let resp = server.get("/customers").await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_list_empty() {
    let server = TestServer::spawn_default().await;
    assert!(list(&server).await.is_empty());
}

#[tokio::test]
async fn test_list_fields_and_order() {
    let server = TestServer::spawn_default().await;
    let a = server.enroll(&[vec![1.0, 0.0, 0.0, 0.0]], Some("a")).await;
    let b = server.enroll(&[vec![0.0, 1.0, 0.0, 0.0]], Some("b")).await;

    let customers = list(&server).await;
    assert_eq!(customers[0]["id"], b["customer_id"]);
    assert_eq!(customers[1]["id"], a["customer_id"]);

    let keys: Vec<&String> = customers[0].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 7);
    for field in [
        "id",
        "display_name",
        "visits_total",
        "visits_since_reward",
        "last_visit_at",
        "created_at",
        "updated_at",
    ] {
        assert!(customers[0].get(field).is_some(), "missing field {field}");
    }

    // A visit moves the customer to the top.
    server.scan(&[1.0, 0.0, 0.0, 0.0]).await;
    let customers = list(&server).await;
    assert_eq!(customers[0]["id"], a["customer_id"]);
    assert_eq!(customers[0]["visits_total"], 1);
    assert!(customers[0]["last_visit_at"].is_string());
    assert_eq!(customers[1]["last_visit_at"], Value::Null);
}

#[tokio::test]
async fn test_delete_then_scan_is_not_found() {
    let server = TestServer::spawn_default().await;
    let enrolled = server.enroll(&[vec![1.0, 0.0, 0.0, 0.0]], None).await;
    let id = enrolled["customer_id"].as_str().unwrap();

    let resp = server.delete(&format!("/customers/{id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "deleted");
    assert_eq!(body["customer_id"], id);

    assert!(list(&server).await.is_empty());
    let body = server.scan(&[1.0, 0.0, 0.0, 0.0]).await;
    assert_eq!(body["status"], "not_found");
}

#[tokio::test]
async fn test_delete_twice_is_not_found() {
    let server = TestServer::spawn_default().await;
    let enrolled = server.enroll(&[vec![1.0, 0.0, 0.0, 0.0]], None).await;
    let path = format!("/customers/{}", enrolled["customer_id"].as_str().unwrap());

    assert_eq!(server.delete(&path).await.status(), StatusCode::OK);

    let resp = server.delete(&path).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Customer not found");
}

#[tokio::test]
async fn test_delete_malformed_id_is_not_found() {
    let server = TestServer::spawn_default().await;
    server.enroll(&[vec![1.0, 0.0, 0.0, 0.0]], None).await;

    let resp = server.delete("/customers/not-a-uuid").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(list(&server).await.len(), 1);
}
