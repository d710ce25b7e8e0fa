//! Visit counting and reward eligibility.
//!
//! Each customer carries two counters: `visits_total`, which only grows, and
//! `visits_since_reward`, which cycles through `[0, reward_every)`. A visit
//! that brings `visits_since_reward` up to `reward_every` earns the reward
//! and resets the cycle.

use serde::Serialize;

/// Name of the single reward tier.
pub const REWARD_NAME: &str = "Free coffee";

/// Visit counters of one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisitCounters {
    /// Matched visits since enrollment.
    pub visits_total: u32,
    /// Matched visits since the last reward.
    pub visits_since_reward: u32,
}

/// Informational label describing the customer at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CustomerState {
    /// First matched visit.
    #[serde(rename = "new customer")]
    New,
    /// Any later visit.
    #[serde(rename = "returning customer")]
    Returning,
}

impl CustomerState {
    /// Derive the label from the visit total after the visit was counted.
    #[must_use]
    pub const fn from_visits_total(visits_total: u32) -> Self {
        if visits_total == 1 {
            Self::New
        } else {
            Self::Returning
        }
    }
}

/// Result of counting one visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitOutcome {
    /// Counters after the visit.
    pub counters: VisitCounters,
    /// Whether this visit earned the reward.
    pub reward_triggered: bool,
}

impl VisitOutcome {
    /// The reward granted by this visit, if any.
    #[must_use]
    pub const fn reward_name(&self) -> Option<&'static str> {
        if self.reward_triggered {
            Some(REWARD_NAME)
        } else {
            None
        }
    }

    /// Describe a counted visit from the counters it produced.
    ///
    /// A counted visit leaves `visits_since_reward` at zero exactly when it
    /// earned the reward, so the outcome agrees with [`record_visit`].
    #[must_use]
    pub const fn from_counters(counters: VisitCounters) -> Self {
        Self {
            counters,
            reward_triggered: counters.visits_total > 0 && counters.visits_since_reward == 0,
        }
    }

    /// Label derived from the new visit total.
    #[must_use]
    pub const fn state(&self) -> CustomerState {
        CustomerState::from_visits_total(self.counters.visits_total)
    }
}

/// Count one matched visit.
///
/// `reward_every` must be non-zero; [`crate::LoyaltyConfig`] guarantees it.
#[must_use]
pub const fn record_visit(counters: VisitCounters, reward_every: u32) -> VisitOutcome {
    let visits_total = counters.visits_total.saturating_add(1);
    let mut visits_since_reward = counters.visits_since_reward.saturating_add(1);

    let reward_triggered = visits_since_reward >= reward_every;
    if reward_triggered {
        visits_since_reward = 0;
    }

    VisitOutcome {
        counters: VisitCounters {
            visits_total,
            visits_since_reward,
        },
        reward_triggered,
    }
}
