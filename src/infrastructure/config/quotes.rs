//! Per-leg quote request configuration.

use serde::{Deserialize, Serialize};

use crate::application::quote::{QuoteSettings, DEFAULT_GENERIC_TICKS};
use crate::application::throttle::ThrottleSettings;
use crate::error::ConfigError;

use super::{seconds, slot_count};

fn default_generic_ticks() -> String {
    DEFAULT_GENERIC_TICKS.into()
}

fn default_contract_lookup_timeout_secs() -> f64 {
    2.0
}

/// `[quotes]` section.
///
/// Environment keys: `IB_USE_SNAPSHOT_DATA`, `IB_MAX_QUOTE_RETRIES`,
/// `IB_QUOTE_RETRY_DELAY`, `MKT_GENERIC_TICKS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotesConfig {
    /// One-shot snapshots instead of streaming subscriptions.
    #[serde(default)]
    pub use_snapshot_data: bool,
    /// Extra requests per leg after the first.
    #[serde(default)]
    pub max_quote_retries: u32,
    /// Pause between requests for one leg, in seconds.
    #[serde(default)]
    pub quote_retry_delay_secs: f64,
    #[serde(default = "default_generic_ticks")]
    pub generic_ticks: String,
    /// Deadline for contract qualification, in seconds.
    #[serde(default = "default_contract_lookup_timeout_secs")]
    pub contract_lookup_timeout_secs: f64,
    /// Whether a failed contract lookup uses up one quote request.
    #[serde(default)]
    pub enrichment_consumes_retry: bool,
    /// Concurrent quote requests allowed across all fetches.
    #[serde(default)]
    pub max_inflight: Option<usize>,
    /// Minimum spacing between quote requests, in seconds.
    #[serde(default)]
    pub min_interval_secs: f64,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            use_snapshot_data: false,
            max_quote_retries: 0,
            quote_retry_delay_secs: 0.0,
            generic_ticks: default_generic_ticks(),
            contract_lookup_timeout_secs: default_contract_lookup_timeout_secs(),
            enrichment_consumes_retry: false,
            max_inflight: None,
            min_interval_secs: 0.0,
        }
    }
}

impl QuotesConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        seconds("quote_retry_delay_secs", self.quote_retry_delay_secs)?;
        seconds("min_interval_secs", self.min_interval_secs)?;
        if seconds("contract_lookup_timeout_secs", self.contract_lookup_timeout_secs)?.is_zero() {
            return Err(ConfigError::invalid(
                "contract_lookup_timeout_secs",
                "must be greater than 0",
            ));
        }
        slot_count("quotes.max_inflight", self.max_inflight)?;
        Ok(())
    }

    /// Fetcher settings for this section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for malformed durations.
    pub fn to_settings(&self) -> Result<QuoteSettings, ConfigError> {
        Ok(QuoteSettings {
            use_snapshot_data: self.use_snapshot_data,
            max_quote_retries: self.max_quote_retries,
            quote_retry_delay: seconds("quote_retry_delay_secs", self.quote_retry_delay_secs)?,
            generic_ticks: self.generic_ticks.trim().to_string(),
            contract_lookup_timeout: seconds(
                "contract_lookup_timeout_secs",
                self.contract_lookup_timeout_secs,
            )?,
            enrichment_consumes_retry: self.enrichment_consumes_retry,
            connect_timeout: None,
        })
    }

    /// Request-level throttle, if any limit is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a malformed interval.
    pub fn throttle(&self) -> Result<Option<ThrottleSettings>, ConfigError> {
        let min_interval = seconds("min_interval_secs", self.min_interval_secs)?;
        if self.max_inflight.is_none() && min_interval.is_zero() {
            return Ok(None);
        }
        Ok(Some(ThrottleSettings {
            max_inflight: self.max_inflight,
            min_interval,
        }))
    }
}
