//! Loyalty programme settings.

use thiserror::Error;

/// Errors raised when validating [`LoyaltyConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoyaltyConfigError {
    /// The embedding dimension is zero.
    #[error("embedding dimension must be greater than zero")]
    ZeroDimension,
    /// The match threshold is outside the cosine distance range.
    #[error("match threshold must be a finite distance in [0, 2], got {0}")]
    InvalidThreshold(f64),
    /// The reward interval is zero.
    #[error("reward interval must be greater than zero")]
    ZeroRewardInterval,
}

/// Immutable settings shared by the normalizer, matcher and ledger.
///
/// Built once at startup and passed explicitly to whatever needs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoyaltyConfig {
    embedding_dim: usize,
    match_threshold: f64,
    reward_every: u32,
}

impl LoyaltyConfig {
    /// Default embedding dimension of the phone-side face model.
    pub const DEFAULT_EMBEDDING_DIM: usize = 192;
    /// Default maximum accepted cosine distance.
    pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.35;
    /// Default number of visits per reward.
    pub const DEFAULT_REWARD_EVERY: u32 = 5;

    /// Create validated settings.
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyConfigError` if the dimension or reward interval is
    /// zero, or if the threshold is not a finite value in `[0, 2]`.
    pub fn new(
        embedding_dim: usize,
        match_threshold: f64,
        reward_every: u32,
    ) -> Result<Self, LoyaltyConfigError> {
        if embedding_dim == 0 {
            return Err(LoyaltyConfigError::ZeroDimension);
        }
        if !match_threshold.is_finite() || !(0.0..=2.0).contains(&match_threshold) {
            return Err(LoyaltyConfigError::InvalidThreshold(match_threshold));
        }
        if reward_every == 0 {
            return Err(LoyaltyConfigError::ZeroRewardInterval);
        }

        Ok(Self {
            embedding_dim,
            match_threshold,
            reward_every,
        })
    }

    /// Dimension D every embedding must have.
    #[must_use]
    pub const fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Maximum cosine distance at which a match is accepted.
    #[must_use]
    pub const fn match_threshold(&self) -> f64 {
        self.match_threshold
    }

    /// Number of visits that earn one reward.
    #[must_use]
    pub const fn reward_every(&self) -> u32 {
        self.reward_every
    }

    /// Whether a match at `distance` is close enough to count.
    #[must_use]
    pub fn accepts(&self, distance: f64) -> bool {
        distance <= self.match_threshold
    }
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            embedding_dim: Self::DEFAULT_EMBEDDING_DIM,
            match_threshold: Self::DEFAULT_MATCH_THRESHOLD,
            reward_every: Self::DEFAULT_REWARD_EVERY,
        }
    }
}
