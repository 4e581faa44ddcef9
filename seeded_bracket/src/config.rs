//! Bracket engine configuration.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketConfig {
    /// How long a writer waits for a division lock per attempt
    pub lock_timeout_ms: u64,
    /// Attempts before giving up with a concurrent-modification error
    pub lock_retry_attempts: u32,
    /// Pause before the second attempt; doubles for every further attempt
    pub lock_retry_backoff_ms: u64,
    /// Pixel height of one first-round match in the layout
    pub cell_unit_height_px: u32,
}

impl BracketConfig {
    /// Load configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `BRACKET_LOCK_TIMEOUT_MS` (default: 2000)
    /// - `BRACKET_LOCK_RETRY_ATTEMPTS` (default: 3)
    /// - `BRACKET_LOCK_RETRY_BACKOFF_MS` (default: 50)
    /// - `BRACKET_CELL_UNIT_HEIGHT_PX` (default: 64)
    ///
    /// Unparseable values fall back to the default; call [`validate`] to
    /// reject values that parse but make no sense.
    ///
    /// [`validate`]: BracketConfig::validate
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lock_timeout_ms: parse_env_or("BRACKET_LOCK_TIMEOUT_MS", defaults.lock_timeout_ms),
            lock_retry_attempts: parse_env_or(
                "BRACKET_LOCK_RETRY_ATTEMPTS",
                defaults.lock_retry_attempts,
            ),
            lock_retry_backoff_ms: parse_env_or(
                "BRACKET_LOCK_RETRY_BACKOFF_MS",
                defaults.lock_retry_backoff_ms,
            ),
            cell_unit_height_px: parse_env_or(
                "BRACKET_CELL_UNIT_HEIGHT_PX",
                defaults.cell_unit_height_px,
            ),
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "BRACKET_LOCK_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.lock_retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "BRACKET_LOCK_RETRY_ATTEMPTS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.cell_unit_height_px == 0 {
            return Err(ConfigError::Invalid {
                var: "BRACKET_CELL_UNIT_HEIGHT_PX".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Backoff before the given retry (1-based)
    pub fn retry_backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.lock_retry_backoff_ms.saturating_mul(factor))
    }
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 2000,
            lock_retry_attempts: 3,
            lock_retry_backoff_ms: 50,
            cell_unit_height_px: 64,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
