//! Health check endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

/// Liveness response, echoing the active loyalty settings.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub embedding_dim: usize,
    pub match_threshold: f64,
    pub reward_every: u32,
}

/// Liveness health check endpoint.
///
/// Does not check dependencies.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let loyalty = state.loyalty();
    Json(HealthResponse {
        ok: true,
        embedding_dim: loyalty.embedding_dim(),
        match_threshold: loyalty.match_threshold(),
        reward_every: loyalty.reward_every(),
    })
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
