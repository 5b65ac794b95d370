//! Per-leg request settings for the quote fetcher.

use std::time::Duration;

/// Generic ticks requested for streaming option quotes (IV, greeks,
/// option volume and open interest).
pub const DEFAULT_GENERIC_TICKS: &str = "100,101,104,106";

/// Per-leg request behaviour of the quote fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSettings {
    /// Request one-shot snapshots instead of streaming subscriptions.
    pub use_snapshot_data: bool,
    /// Extra requests per leg after the first.
    pub max_quote_retries: u32,
    /// Pause between requests for the same leg.
    pub quote_retry_delay: Duration,
    /// Generic tick list for streaming requests.
    pub generic_ticks: String,
    /// Deadline for contract qualification.
    pub contract_lookup_timeout: Duration,
    /// Whether a failed qualification uses up one of the leg's requests.
    pub enrichment_consumes_retry: bool,
    /// Deadline for opening the gateway session; the request timeout when unset.
    pub connect_timeout: Option<Duration>,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            use_snapshot_data: false,
            max_quote_retries: 0,
            quote_retry_delay: Duration::ZERO,
            generic_ticks: DEFAULT_GENERIC_TICKS.to_string(),
            contract_lookup_timeout: Duration::from_secs(2),
            enrichment_consumes_retry: false,
            connect_timeout: None,
        }
    }
}

impl QuoteSettings {
    /// Requests allowed per leg.
    #[must_use]
    pub const fn attempts_per_leg(&self) -> u32 {
        self.max_quote_retries.saturating_add(1)
    }

    /// Session connect deadline for a call whose requests use `request_timeout`.
    #[must_use]
    pub fn connect_deadline(&self, request_timeout: Duration) -> Duration {
        self.connect_timeout.unwrap_or(request_timeout)
    }
}
