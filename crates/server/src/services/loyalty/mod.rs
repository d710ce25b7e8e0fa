//! Loyalty service.
//!
//! Ties the pure core (normalizer, matcher, ledger) to the customer store:
//!
//! ```text
//! scan:   normalize -> load all embeddings -> best match -> threshold -> record visit
//! enroll: normalize each sample -> mean -> re-normalize -> insert
//! ```

mod error;

pub use error::LoyaltyError;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use visitmark_core::{CustomerId, LoyaltyConfig, UnitVector, find_best_match};

use crate::db::{CustomerRepository, RepositoryError};
use crate::models::{Customer, RecordedVisit};

/// Result of a scan-visit.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Nobody is enrolled, or the closest customer is too far away.
    NotFound {
        /// Distance to the closest customer, if any customer exists.
        distance: Option<f64>,
    },
    /// A customer matched and the visit was counted.
    Matched {
        /// The counted visit.
        visit: RecordedVisit,
        /// Cosine distance between the scan and the customer's embedding.
        distance: f64,
    },
}

/// Loyalty service.
///
/// Handles enrollment, scan-visit matching and customer management.
pub struct LoyaltyService<'a> {
    customers: CustomerRepository<'a>,
    config: &'a LoyaltyConfig,
}

impl<'a> LoyaltyService<'a> {
    /// Create a new loyalty service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, config: &'a LoyaltyConfig) -> Self {
        Self {
            customers: CustomerRepository::new(pool, config.embedding_dim()),
            config,
        }
    }

    /// Enroll a new customer from one or more embedding samples.
    ///
    /// Enrollment never de-duplicates: enrolling the same person twice
    /// creates two customers, and scans pick whichever is closer.
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::Embedding` if there are no samples, any sample
    /// is invalid, or the samples average to zero. Nothing is stored then.
    /// Returns `LoyaltyError::Repository` if the insert fails.
    #[instrument(skip(self, samples), fields(samples = samples.len()))]
    pub async fn enroll(
        &self,
        samples: &[Vec<f32>],
        display_name: Option<&str>,
    ) -> Result<Customer, LoyaltyError> {
        let embedding = UnitVector::mean_of(samples, self.config.embedding_dim())?;

        let customer = self
            .customers
            .create(CustomerId::generate(), display_name, &embedding, Utc::now())
            .await?;

        info!(customer_id = %customer.id, "Customer enrolled");
        Ok(customer)
    }

    /// Match a scanned embedding against all customers and count the visit.
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::Embedding` if the scan is invalid.
    /// Returns `LoyaltyError::Repository` if the store fails, including when a
    /// stored embedding is corrupt.
    #[instrument(skip(self, embedding), fields(device_id = device_id.unwrap_or("-")))]
    pub async fn scan_visit(
        &self,
        embedding: &[f32],
        device_id: Option<&str>,
    ) -> Result<ScanOutcome, LoyaltyError> {
        let query = UnitVector::normalize(embedding, self.config.embedding_dim())?;

        let candidates = self.customers.embeddings().await?;
        let Some(best) = find_best_match(&query, candidates.iter().map(|(id, v)| (id, v))) else {
            debug!("No customers enrolled");
            return Ok(ScanOutcome::NotFound { distance: None });
        };

        if !self.config.accepts(best.distance) {
            debug!(distance = best.distance, "Closest customer above threshold");
            return Ok(ScanOutcome::NotFound {
                distance: Some(best.distance),
            });
        }

        let Some(visit) = self
            .customers
            .record_visit(best.id, self.config.reward_every(), Utc::now())
            .await?
        else {
            // Deleted between the match and the update.
            debug!(customer_id = %best.id, "Matched customer vanished");
            return Ok(ScanOutcome::NotFound {
                distance: Some(best.distance),
            });
        };

        info!(
            customer_id = %best.id,
            distance = best.distance,
            visits_total = visit.outcome.counters.visits_total,
            reward = visit.outcome.reward_triggered,
            "Visit recorded"
        );

        Ok(ScanOutcome::Matched {
            visit,
            distance: best.distance,
        })
    }

    /// List all customers, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::Repository` if the query fails.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, LoyaltyError> {
        Ok(self.customers.list().await?)
    }

    /// Delete a customer by its textual ID.
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::CustomerNotFound` if the ID is malformed or
    /// unknown.
    /// Returns `LoyaltyError::Repository` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: &str) -> Result<CustomerId, LoyaltyError> {
        let id = CustomerId::parse(customer_id)
            .map_err(|_| LoyaltyError::CustomerNotFound(customer_id.to_owned()))?;

        self.customers.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => LoyaltyError::CustomerNotFound(customer_id.to_owned()),
            other => LoyaltyError::Repository(other),
        })?;

        info!(customer_id = %id, "Customer deleted");
        Ok(id)
    }
}
