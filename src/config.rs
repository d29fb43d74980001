//! Client configuration
//!
//! One canonical default table, overridable per value through environment
//! variables. Resolution never fails for missing variables; it fails only
//! when a present value does not parse or violates a bound.

use std::env;
use std::time::Duration;

use crate::error::TransferError;

pub const DEFAULT_API_URL: &str = "http://localhost:8123";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;

pub const ENV_API_URL: &str = "TRANSFER_API_URL";
pub const ENV_TIMEOUT: &str = "TRANSFER_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "TRANSFER_MAX_RETRIES";
pub const ENV_BACKOFF_FACTOR: &str = "TRANSFER_BACKOFF_FACTOR";

/// Settings for one transfer client instance.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Base URL of the transfer API, without a trailing slash.
    pub api_base_url: String,
    /// Per-attempt HTTP timeout in seconds. Must be greater than zero.
    pub timeout_secs: u64,
    /// Retries allowed on top of the initial attempt.
    pub max_retries: u32,
    /// Multiplier for the binary exponential backoff delays.
    ///
    /// 1.0 yields 1s, 2s, 4s, 8s between consecutive attempts.
    pub backoff_factor: f64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl TransferConfig {
    /// Resolve configuration from process environment variables.
    ///
    /// Unset variables fall back to the defaults; a variable that is set
    /// but unparseable or out of bounds is a hard error, never silently
    /// replaced.
    pub fn from_env() -> Result<Self, TransferError> {
        Self::from_source(|key| env::var(key).ok())
    }

    fn from_source<F>(lookup: F) -> Result<Self, TransferError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            api_base_url: lookup(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout_secs: parse_value(ENV_TIMEOUT, lookup(ENV_TIMEOUT), DEFAULT_TIMEOUT_SECS)?,
            max_retries: parse_value(ENV_MAX_RETRIES, lookup(ENV_MAX_RETRIES), DEFAULT_MAX_RETRIES)?,
            backoff_factor: parse_value(
                ENV_BACKOFF_FACTOR,
                lookup(ENV_BACKOFF_FACTOR),
                DEFAULT_BACKOFF_FACTOR,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Bounds checks shared by every construction path.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.timeout_secs == 0 {
            return Err(TransferError::InvalidConfig {
                key: ENV_TIMEOUT,
                value: self.timeout_secs.to_string(),
            });
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(TransferError::InvalidConfig {
                key: ENV_BACKOFF_FACTOR,
                value: self.backoff_factor.to_string(),
            });
        }
        Ok(())
    }

    /// Per-attempt timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_value<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, TransferError> {
    match raw {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => Err(TransferError::InvalidConfig { key, value: raw }),
        },
        None => Ok(default),
    }
}
