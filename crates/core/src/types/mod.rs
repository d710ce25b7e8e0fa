//! Core types for Visitmark.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the server and the CLI.

pub mod config;
pub mod embedding;
pub mod id;

pub use config::{LoyaltyConfig, LoyaltyConfigError};
pub use embedding::{EmbeddingError, UnitVector};
pub use id::{CustomerId, CustomerIdError};
