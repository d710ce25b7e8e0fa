//! Enrollment and scan-visit endpoints.
//!
//! These are the two calls the phone app makes: once at sign-up with a few
//! face samples, then on every visit with a single embedding.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use visitmark_core::{CustomerId, CustomerState};

use crate::error::Result;
use crate::services::ScanOutcome;
use crate::state::AppState;

// ============================================================================
// Enrollment
// ============================================================================

/// Enrollment request.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    /// One or more face embeddings of the same person; they are averaged.
    pub embeddings: Vec<Vec<f32>>,
    /// Optional label, e.g. a first name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Enrollment status, always `created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollStatus {
    Created,
}

/// Enrollment response.
#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    pub status: EnrollStatus,
    pub customer_id: CustomerId,
    pub display_name: Option<String>,
    pub visits_total: u32,
    pub visits_since_reward: u32,
    pub last_visit_at: Option<DateTime<Utc>>,
}

/// Enroll a new customer.
pub async fn enroll(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EnrollRequest>, JsonRejection>,
) -> Result<Json<EnrollResponse>> {
    let Json(request) = payload?;

    let customer = state
        .loyalty_service()
        .enroll(&request.embeddings, request.display_name.as_deref())
        .await?;

    Ok(Json(EnrollResponse {
        status: EnrollStatus::Created,
        customer_id: customer.id,
        display_name: customer.display_name,
        visits_total: customer.counters.visits_total,
        visits_since_reward: customer.counters.visits_since_reward,
        last_visit_at: customer.last_visit_at,
    }))
}

// ============================================================================
// Scan visit
// ============================================================================

/// Scan-visit request.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Face embedding captured on this visit.
    pub embedding: Vec<f32>,
    /// Identifier of the scanning phone, used for logging only.
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Whether the scan matched a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Matched,
    NotFound,
}

/// Scan-visit response.
///
/// Always carries every field; a miss leaves the customer fields `null`.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub status: ScanStatus,
    pub state_label: Option<CustomerState>,
    pub customer_id: Option<CustomerId>,
    pub display_name: Option<String>,
    pub visits_total: Option<u32>,
    pub visits_since_reward: Option<u32>,
    pub reward: bool,
    pub reward_name: Option<&'static str>,
    pub match_distance: Option<f64>,
    pub last_visit_at: Option<DateTime<Utc>>,
}

impl ScanResponse {
    const fn not_found(distance: Option<f64>) -> Self {
        Self {
            status: ScanStatus::NotFound,
            state_label: None,
            customer_id: None,
            display_name: None,
            visits_total: None,
            visits_since_reward: None,
            reward: false,
            reward_name: None,
            match_distance: distance,
            last_visit_at: None,
        }
    }
}

impl From<ScanOutcome> for ScanResponse {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::NotFound { distance } => Self::not_found(distance),
            ScanOutcome::Matched { visit, distance } => {
                let counters = visit.outcome.counters;
                Self {
                    status: ScanStatus::Matched,
                    state_label: Some(visit.outcome.state()),
                    customer_id: Some(visit.customer.id),
                    display_name: visit.customer.display_name,
                    visits_total: Some(counters.visits_total),
                    visits_since_reward: Some(counters.visits_since_reward),
                    reward: visit.outcome.reward_triggered,
                    reward_name: visit.outcome.reward_name(),
                    match_distance: Some(distance),
                    last_visit_at: visit.customer.last_visit_at,
                }
            }
        }
    }
}

/// Match a scanned face against enrolled customers and count the visit.
pub async fn scan_visit(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>> {
    let Json(request) = payload?;

    let outcome = state
        .loyalty_service()
        .scan_visit(&request.embedding, request.device_id.as_deref())
        .await?;

    Ok(Json(outcome.into()))
}
