//! Configuration for the write path.

use thiserror::Error;

/// Environment variable overriding [`WriteConfig::max_attempts`].
pub const MAX_ATTEMPTS_ENV: &str = "STOREFRONT_STATUS_WRITE_MAX_ATTEMPTS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// How the dispatcher retries writes that lost an optimistic-concurrency race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteConfig {
    /// Total attempts per write, including the first one. Always >= 1.
    pub max_attempts: u32,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl WriteConfig {
    /// Single attempt; conflicts are surfaced immediately.
    pub fn no_retry() -> Self {
        Self { max_attempts: 1 }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_ATTEMPTS_ENV) {
            config.max_attempts = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidNumber {
                    key: MAX_ATTEMPTS_ENV,
                    value: raw.clone(),
                })?;
        }

        Ok(config)
    }
}
