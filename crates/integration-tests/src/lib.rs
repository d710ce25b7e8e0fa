//! End-to-end test harness for Visitmark.
//!
//! Each test spawns the real router on an ephemeral port, backed by a fresh
//! in-memory `SQLite` database, and talks to it with `reqwest`.
//!
//! ```rust,ignore
//! let server = TestServer::spawn(4, 0.35, 5).await;
//! let resp = server.get("/health").await;
//! assert_eq!(resp.status(), 200);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::{Client, Response};
use serde_json::Value;
use sqlx::SqlitePool;
use visitmark_core::LoyaltyConfig;
use visitmark_server::{AppState, app, db};

/// A running server plus a client pointed at it.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub pool: SqlitePool,
}

impl TestServer {
    /// Start a server with the given dimension, threshold and reward interval.
    ///
    /// # Panics
    ///
    /// Panics if the database or listener cannot be set up.
    pub async fn spawn(embedding_dim: usize, match_threshold: f64, reward_every: u32) -> Self {
        let loyalty = LoyaltyConfig::new(embedding_dim, match_threshold, reward_every)
            .expect("Invalid test loyalty settings");

        let pool = db::connect_in_memory()
            .await
            .expect("Failed to open in-memory database");
        db::migrate(&pool).await.expect("Failed to migrate");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let router = app(AppState::new(loyalty, pool.clone()));
        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            pool,
        }
    }

    /// Start a server with D=4, threshold 0.35 and a reward every 5 visits.
    pub async fn spawn_default() -> Self {
        Self::spawn(4, 0.35, 5).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a GET request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// Send a POST request with a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Send a DELETE request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE request failed")
    }

    /// Enroll a customer and return the response body.
    ///
    /// # Panics
    ///
    /// Panics if enrollment does not succeed.
    pub async fn enroll(&self, embeddings: &[Vec<f32>], display_name: Option<&str>) -> Value {
        let resp = self
            .post_json(
                "/enroll",
                &serde_json::json!({ "embeddings": embeddings, "display_name": display_name }),
            )
            .await;
        assert!(resp.status().is_success(), "enroll failed: {}", resp.status());
        resp.json().await.expect("Invalid enroll response")
    }

    /// Scan an embedding and return the response body.
    ///
    /// # Panics
    ///
    /// Panics if the scan does not succeed.
    pub async fn scan(&self, embedding: &[f32]) -> Value {
        let resp = self
            .post_json(
                "/scan-visit",
                &serde_json::json!({ "embedding": embedding, "device_id": "test-phone" }),
            )
            .await;
        assert!(resp.status().is_success(), "scan failed: {}", resp.status());
        resp.json().await.expect("Invalid scan response")
    }
}
