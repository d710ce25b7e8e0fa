//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Loyalty programme
//! - `EMBEDDING_DIM` - Embedding dimension of the phone model (default: 192)
//! - `MATCH_THRESHOLD` - Maximum accepted cosine distance (default: 0.35)
//! - `REWARD_EVERY` - Visits per reward (default: 5)
//!
//! ## Server
//! - `LOYALTY_DATABASE_URL` - `SQLite` connection string, falls back to
//!   `DATABASE_URL` (default: `sqlite://loyalty.sqlite3?mode=rwc`)
//! - `LOYALTY_HOST` - Bind address (default: 127.0.0.1)
//! - `LOYALTY_PORT` - Listen port (default: 8000)
//! - `LOG_FORMAT` - `text` or `json` (default: text)
//!
//! ## Error tracking
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use visitmark_core::{LoyaltyConfig, LoyaltyConfigError};

const DEFAULT_DATABASE_URL: &str = "sqlite://loyalty.sqlite3?mode=rwc";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid loyalty settings: {0}")]
    Loyalty(#[from] LoyaltyConfigError),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Embedding dimension, match threshold and reward interval
    pub loyalty: LoyaltyConfig,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let loyalty = LoyaltyConfig::new(
            env.parse_or("EMBEDDING_DIM", LoyaltyConfig::DEFAULT_EMBEDDING_DIM)?,
            env.parse_or("MATCH_THRESHOLD", LoyaltyConfig::DEFAULT_MATCH_THRESHOLD)?,
            env.parse_or("REWARD_EVERY", LoyaltyConfig::DEFAULT_REWARD_EVERY)?,
        )?;

        let database_url = env
            .get("LOYALTY_DATABASE_URL")
            .or_else(|| env.get("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        Ok(Self {
            database_url: SecretString::from(database_url),
            host: env.parse_or("LOYALTY_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: env.parse_or("LOYALTY_PORT", 8000)?,
            loyalty,
            log_format: env.parse_or("LOG_FORMAT", LogFormat::Text)?,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a variable, treating blank values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, or fall back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.loyalty, LoyaltyConfig::default());
        assert_eq!(config.database_url.expose_secret(), DEFAULT_DATABASE_URL);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_loyalty_overrides() {
        let config = config_from(&[
            ("EMBEDDING_DIM", "128"),
            ("MATCH_THRESHOLD", "0.4"),
            ("REWARD_EVERY", "10"),
        ])
        .unwrap();
        assert_eq!(config.loyalty.embedding_dim(), 128);
        assert!((config.loyalty.match_threshold() - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.loyalty.reward_every(), 10);
    }

    #[test]
    fn test_database_url_fallback() {
        let config = config_from(&[("DATABASE_URL", "sqlite::memory:")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "sqlite::memory:");

        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("LOYALTY_DATABASE_URL", "sqlite://primary.db"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "sqlite://primary.db");
    }

    #[test]
    fn test_invalid_number() {
        let err = config_from(&[("EMBEDDING_DIM", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "EMBEDDING_DIM"));
    }

    #[test]
    fn test_invalid_loyalty_settings() {
        let err = config_from(&[("REWARD_EVERY", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Loyalty(LoyaltyConfigError::ZeroRewardInterval)
        ));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("LOYALTY_PORT", "  "), ("SENTRY_DSN", "")]).unwrap();
        assert_eq!(config.port, 8000);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_log_format() {
        let config = config_from(&[("LOG_FORMAT", "JSON")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config_from(&[("LOG_FORMAT", "xml")]).is_err());
    }
}
