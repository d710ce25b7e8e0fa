//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;
use visitmark_core::LoyaltyConfig;

use crate::services::LoyaltyService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// database pool and the loyalty settings fixed at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    loyalty: LoyaltyConfig,
    pool: SqlitePool,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `loyalty` - Embedding dimension, match threshold and reward interval
    /// * `pool` - `SQLite` connection pool with migrations applied
    #[must_use]
    pub fn new(loyalty: LoyaltyConfig, pool: SqlitePool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { loyalty, pool }),
        }
    }

    /// Get a reference to the loyalty settings.
    #[must_use]
    pub fn loyalty(&self) -> &LoyaltyConfig {
        &self.inner.loyalty
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Build a loyalty service borrowing this state.
    #[must_use]
    pub fn loyalty_service(&self) -> LoyaltyService<'_> {
        LoyaltyService::new(self.pool(), self.loyalty())
    }
}
