//! Customer domain types.
//!
//! These types represent validated domain objects separate from database row
//! types. The enrolled embedding is not part of [`Customer`]: it is only read
//! by the matcher and never changes after enrollment.

use chrono::{DateTime, Utc};

use visitmark_core::{CustomerId, VisitCounters, VisitOutcome};

/// An enrolled customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Optional label given at enrollment.
    pub display_name: Option<String>,
    /// Visit counters.
    pub counters: VisitCounters,
    /// When the customer was last matched, if ever.
    pub last_visit_at: Option<DateTime<Utc>>,
    /// When the customer was enrolled.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

/// A visit counted against a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVisit {
    /// The customer after the visit was applied.
    pub customer: Customer,
    /// Ledger result of the visit.
    pub outcome: VisitOutcome,
}
