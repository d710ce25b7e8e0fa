//! HTTP route handlers for the loyalty server.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health            - Liveness check with active loyalty settings
//! GET    /health/ready      - Readiness check (database)
//!
//! # Phone app
//! POST   /enroll            - Enroll a customer from face embeddings
//! POST   /scan-visit        - Match a face and count the visit
//!
//! # Management
//! GET    /customers         - List customers, most recently updated first
//! DELETE /customers/{id}    - Delete a customer
//! ```

pub mod customers;
pub mod health;
pub mod visits;

use axum::{
    Router,
    http::{Request, Response, Uri},
    routing::{delete, get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the API routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/enroll", post(visits::enroll))
        .route("/scan-visit", post(visits::scan_visit))
        .route("/customers", get(customers::list))
        .route("/customers/{id}", delete(customers::delete))
}

/// Build the complete application with middleware applied.
pub fn app(state: AppState) -> Router {
    routes()
        .fallback(not_found)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
