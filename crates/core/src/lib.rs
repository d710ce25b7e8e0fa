//! Visitmark Core - Embedding matching and visit bookkeeping.
//!
//! This crate holds the pure logic shared by the Visitmark components:
//! - `server` - HTTP API used by the venue's phones
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains no I/O, no database access and no HTTP. Storage
//! and transport live in the server crate; everything here is deterministic
//! and unit-testable.
//!
//! # Modules
//!
//! - [`types`] - Customer IDs, unit-vector embeddings and loyalty settings
//! - [`matcher`] - Cosine distance and linear nearest-neighbour scan
//! - [`ledger`] - Visit counters and reward state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ledger;
pub mod matcher;
pub mod types;

pub use ledger::{CustomerState, REWARD_NAME, VisitCounters, VisitOutcome, record_visit};
pub use matcher::{Match, cosine_distance, find_best_match};
pub use types::*;
