//! Business logic services for the loyalty server.
//!
//! # Services
//!
//! - `loyalty` - Enrollment, scan-visit matching and customer management

pub mod loyalty;

pub use loyalty::{LoyaltyError, LoyaltyService, ScanOutcome};
