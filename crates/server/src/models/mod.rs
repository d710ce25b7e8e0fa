//! Domain models for the loyalty server.

pub mod customer;

pub use customer::{Customer, RecordedVisit};
