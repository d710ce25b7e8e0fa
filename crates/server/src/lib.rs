//! Visitmark server library.
//!
//! Face-embedding loyalty tracking over HTTP. A phone app enrolls customers
//! with face embeddings and later scans them on each visit; every
//! `REWARD_EVERY`-th matched visit earns a reward.
//!
//! The binary in `main.rs` wires configuration, logging and Sentry around
//! [`routes::app`]. The CLI and the integration tests reuse the same modules.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::AppError;
pub use routes::app;
pub use state::AppState;
