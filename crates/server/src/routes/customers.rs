//! Customer management endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use visitmark_core::CustomerId;

use crate::error::Result;
use crate::models::Customer;
use crate::state::AppState;

/// Customer as shown in the management list.
#[derive(Debug, Serialize)]
pub struct CustomerView {
    pub id: CustomerId,
    pub display_name: Option<String>,
    pub visits_total: u32,
    pub visits_since_reward: u32,
    pub last_visit_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerView {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            display_name: customer.display_name,
            visits_total: customer.counters.visits_total,
            visits_since_reward: customer.counters.visits_since_reward,
            last_visit_at: customer.last_visit_at,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

/// Deletion status, always `deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    Deleted,
}

/// Deletion response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: DeleteStatus,
    pub customer_id: CustomerId,
}

/// List all customers, most recently updated first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CustomerView>>> {
    let customers = state.loyalty_service().list_customers().await?;
    Ok(Json(customers.into_iter().map(CustomerView::from).collect()))
}

/// Delete a customer.
pub async fn delete(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let customer_id = state.loyalty_service().delete_customer(&customer_id).await?;
    Ok(Json(DeleteResponse {
        status: DeleteStatus::Deleted,
        customer_id,
    }))
}
