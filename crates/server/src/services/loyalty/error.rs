//! Loyalty service error types.

use thiserror::Error;
use visitmark_core::EmbeddingError;

use crate::db::RepositoryError;

/// Errors that can occur during loyalty operations.
#[derive(Debug, Error)]
pub enum LoyaltyError {
    /// The submitted embedding is invalid.
    #[error("invalid embedding: {0}")]
    Embedding(#[from] EmbeddingError),

    /// No customer has the requested ID.
    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
