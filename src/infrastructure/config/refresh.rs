//! Refresh pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::application::pipeline::RefreshDefaults;
use crate::domain::AcceptanceCriteria;
use crate::error::ConfigError;

use super::{seconds, slot_count};

fn default_timeout_secs() -> f64 {
    15.0
}

const fn default_max_attempts() -> u32 {
    1
}

/// `[refresh]` section.
///
/// Environment keys: `MARKET_DATA_TIMEOUT`, `PIPELINE_REFRESH_ATTEMPTS`,
/// `PIPELINE_REFRESH_RETRY_DELAY`, `PIPELINE_REFRESH_PARALLEL`,
/// `PIPELINE_REFRESH_MAX_WORKERS`, `PIPELINE_REFRESH_MAX_INFLIGHT`,
/// `PIPELINE_REFRESH_MIN_INTERVAL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Deadline for each gateway wait, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    /// Fetch attempts per entry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Pause between attempts, in seconds.
    #[serde(default)]
    pub retry_delay_secs: f64,
    /// Run entries on a worker pool.
    #[serde(default)]
    pub parallel: bool,
    /// Worker pool size; defaults to the entry count capped at 32.
    #[serde(default)]
    pub max_workers: Option<usize>,
    /// Concurrent fetches allowed across the pool.
    #[serde(default)]
    pub max_inflight: Option<usize>,
    /// Minimum spacing between fetch starts, in seconds.
    #[serde(default)]
    pub min_interval_secs: f64,
    /// Annual risk-free rate for parity pricing.
    #[serde(default)]
    pub interest_rate: f64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: 0.0,
            parallel: false,
            max_workers: None,
            max_inflight: None,
            min_interval_secs: 0.0,
            interest_rate: 0.0,
        }
    }
}

impl RefreshConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if seconds("timeout_secs", self.timeout_secs)?.is_zero() {
            return Err(ConfigError::invalid("timeout_secs", "must be greater than 0"));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("max_attempts", "must be at least 1"));
        }
        seconds("retry_delay_secs", self.retry_delay_secs)?;
        seconds("min_interval_secs", self.min_interval_secs)?;
        slot_count("max_workers", self.max_workers)?;
        slot_count("max_inflight", self.max_inflight)?;
        if !self.interest_rate.is_finite() {
            return Err(ConfigError::invalid("interest_rate", "must be a finite number"));
        }
        Ok(())
    }

    /// Pipeline defaults for this section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for durations that are negative
    /// or not finite.
    pub fn to_defaults(&self, criteria: &AcceptanceCriteria) -> Result<RefreshDefaults, ConfigError> {
        Ok(RefreshDefaults {
            timeout: seconds("timeout_secs", self.timeout_secs)?,
            max_attempts: self.max_attempts,
            retry_delay: seconds("retry_delay_secs", self.retry_delay_secs)?,
            parallel: self.parallel,
            max_workers: self.max_workers,
            max_inflight: self.max_inflight,
            min_interval: seconds("min_interval_secs", self.min_interval_secs)?,
            interest_rate: self.interest_rate,
            criteria: criteria.clone(),
        })
    }
}
