//! Run parameters and their resolution.
//!
//! Every setting is taken from the explicit [`RefreshParams`] first, then
//! from the process-wide [`RefreshDefaults`], then from built-in defaults.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::sort::SortKeyFn;
use crate::application::throttle::ThrottleSettings;
use crate::domain::AcceptanceCriteria;
use crate::error::ConfigError;
use crate::port::{ProposalBuilder, SnapshotFetcher};

/// Upper bound on the default worker pool size.
pub const MAX_DEFAULT_WORKERS: usize = 32;

/// Trigger label used when the caller does not name one.
pub const DEFAULT_TRIGGER: &str = "pipeline_refresh";

/// Process-wide refresh defaults, usually loaded from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshDefaults {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub parallel: bool,
    pub max_workers: Option<usize>,
    pub max_inflight: Option<usize>,
    pub min_interval: Duration,
    pub interest_rate: f64,
    pub criteria: AcceptanceCriteria,
}

impl Default for RefreshDefaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_attempts: 1,
            retry_delay: Duration::ZERO,
            parallel: false,
            max_workers: None,
            max_inflight: None,
            min_interval: Duration::ZERO,
            interest_rate: 0.0,
            criteria: AcceptanceCriteria::default(),
        }
    }
}

/// Per-call overrides. Unset fields fall back to [`RefreshDefaults`].
///
/// Durations are given in seconds so that malformed caller input (negative
/// or NaN) can be reported instead of silently clamped.
#[derive(Clone, Default)]
pub struct RefreshParams {
    pub criteria: Option<AcceptanceCriteria>,
    pub spot_price: Option<f64>,
    pub interest_rate: Option<f64>,
    pub timeout_secs: Option<f64>,
    pub max_attempts: Option<u32>,
    pub retry_delay_secs: Option<f64>,
    pub parallel: Option<bool>,
    pub max_workers: Option<usize>,
    pub max_inflight: Option<usize>,
    pub min_interval_secs: Option<f64>,
    pub trigger: Option<String>,
    pub builder: Option<Arc<dyn ProposalBuilder>>,
    pub fetcher: Option<Arc<dyn SnapshotFetcher>>,
    pub sort_key: Option<SortKeyFn>,
}

impl fmt::Debug for RefreshParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshParams")
            .field("spot_price", &self.spot_price)
            .field("interest_rate", &self.interest_rate)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("parallel", &self.parallel)
            .field("max_workers", &self.max_workers)
            .field("max_inflight", &self.max_inflight)
            .field("min_interval_secs", &self.min_interval_secs)
            .field("trigger", &self.trigger)
            .field("builder", &self.builder.is_some())
            .field("fetcher", &self.fetcher.is_some())
            .field("sort_key", &self.sort_key.is_some())
            .finish_non_exhaustive()
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub criteria: AcceptanceCriteria,
    pub spot_price: Option<f64>,
    pub interest_rate: f64,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub parallel: bool,
    pub max_workers: Option<usize>,
    pub throttle: ThrottleSettings,
    pub trigger: String,
}

impl RunSettings {
    /// Merge `params` over `defaults` and validate the result.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for zero attempts, workers or in-flight
    /// bounds, non-finite or negative durations, a non-positive timeout, or
    /// a non-finite spot price or rate.
    pub fn resolve(params: &RefreshParams, defaults: &RefreshDefaults) -> Result<Self, ConfigError> {
        let timeout = match params.timeout_secs {
            Some(secs) => seconds("timeout", secs)?,
            None => defaults.timeout,
        };
        if timeout.is_zero() {
            return Err(ConfigError::invalid("timeout", "must be greater than zero"));
        }

        let max_attempts = params.max_attempts.unwrap_or(defaults.max_attempts);
        if max_attempts == 0 {
            return Err(ConfigError::invalid("max_attempts", "must be at least 1"));
        }

        let retry_delay = match params.retry_delay_secs {
            Some(secs) => seconds("retry_delay", secs)?,
            None => defaults.retry_delay,
        };
        let min_interval = match params.min_interval_secs {
            Some(secs) => seconds("min_interval", secs)?,
            None => defaults.min_interval,
        };

        let max_workers = slot_count("max_workers", params.max_workers.or(defaults.max_workers))?;
        let max_inflight =
            slot_count("max_inflight", params.max_inflight.or(defaults.max_inflight))?;

        if params.spot_price.is_some_and(|spot| !spot.is_finite()) {
            return Err(ConfigError::invalid("spot_price", "must be a finite number"));
        }
        let interest_rate = params.interest_rate.unwrap_or(defaults.interest_rate);
        if !interest_rate.is_finite() {
            return Err(ConfigError::invalid("interest_rate", "must be a finite number"));
        }

        Ok(Self {
            criteria: params
                .criteria
                .clone()
                .unwrap_or_else(|| defaults.criteria.clone()),
            spot_price: params.spot_price,
            interest_rate,
            timeout,
            max_attempts,
            retry_delay,
            parallel: params.parallel.unwrap_or(defaults.parallel),
            max_workers,
            throttle: ThrottleSettings {
                max_inflight,
                min_interval,
            },
            trigger: params
                .trigger
                .clone()
                .unwrap_or_else(|| DEFAULT_TRIGGER.to_string()),
        })
    }

    /// Worker pool size for `entries` entries, or `None` to run sequentially.
    #[must_use]
    pub fn workers_for(&self, entries: usize) -> Option<usize> {
        if !self.parallel || entries <= 1 {
            return None;
        }
        Some(
            self.max_workers
                .unwrap_or_else(|| entries.min(MAX_DEFAULT_WORKERS)),
        )
    }
}

/// Longest accepted duration setting: one year.
pub const MAX_SECONDS: f64 = 365.0 * 24.0 * 3600.0;

/// Convert caller seconds to a duration, rejecting negative, non-finite and
/// longer-than-[`MAX_SECONDS`] values.
pub(crate) fn seconds(field: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::invalid(
            field,
            format!("must be a non-negative number of seconds, got {secs}"),
        ));
    }
    if secs > MAX_SECONDS {
        return Err(ConfigError::invalid(
            field,
            format!("must be at most {MAX_SECONDS} seconds, got {secs}"),
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|err| ConfigError::invalid(field, err.to_string()))
}

/// Check an optional concurrency bound: at least one, and no more slots
/// than a semaphore can hold.
pub(crate) fn slot_count(
    field: &'static str,
    value: Option<usize>,
) -> Result<Option<usize>, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::invalid(field, "must be at least 1")),
        Some(limit) if limit > Semaphore::MAX_PERMITS => Err(ConfigError::invalid(
            field,
            format!("must be at most {}, got {limit}", Semaphore::MAX_PERMITS),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_are_empty() {
        let settings = RunSettings::resolve(&RefreshParams::default(), &RefreshDefaults::default()).unwrap();

        assert_eq!(settings.timeout, Duration::from_secs(15));
        assert_eq!(settings.max_attempts, 1);
        assert_eq!(settings.retry_delay, Duration::ZERO);
        assert!(!settings.parallel);
        assert_eq!(settings.throttle, ThrottleSettings::default());
        assert_eq!(settings.trigger, DEFAULT_TRIGGER);
    }

    #[test]
    fn params_take_precedence_over_defaults() {
        let defaults = RefreshDefaults {
            max_attempts: 3,
            parallel: true,
            max_inflight: Some(4),
            ..Default::default()
        };
        let params = RefreshParams {
            max_attempts: Some(2),
            retry_delay_secs: Some(0.25),
            parallel: Some(false),
            ..Default::default()
        };

        let settings = RunSettings::resolve(&params, &defaults).unwrap();
        assert_eq!(settings.max_attempts, 2);
        assert_eq!(settings.retry_delay, Duration::from_millis(250));
        assert!(!settings.parallel);
        assert_eq!(settings.throttle.max_inflight, Some(4));
    }

    #[test]
    fn malformed_params_are_rejected() {
        let defaults = RefreshDefaults::default();
        let cases = [
            RefreshParams {
                max_attempts: Some(0),
                ..Default::default()
            },
            RefreshParams {
                retry_delay_secs: Some(-1.0),
                ..Default::default()
            },
            RefreshParams {
                timeout_secs: Some(f64::NAN),
                ..Default::default()
            },
            RefreshParams {
                timeout_secs: Some(0.0),
                ..Default::default()
            },
            RefreshParams {
                max_workers: Some(0),
                ..Default::default()
            },
            RefreshParams {
                max_inflight: Some(0),
                ..Default::default()
            },
            RefreshParams {
                max_inflight: Some(usize::MAX),
                ..Default::default()
            },
            RefreshParams {
                max_workers: Some(Semaphore::MAX_PERMITS + 1),
                ..Default::default()
            },
            RefreshParams {
                min_interval_secs: Some(1e19),
                ..Default::default()
            },
            RefreshParams {
                timeout_secs: Some(MAX_SECONDS * 2.0),
                ..Default::default()
            },
        ];

        for params in &cases {
            let err = RunSettings::resolve(params, &defaults).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "{params:?}");
        }
    }

    #[test]
    fn worker_pool_size_defaults_to_entry_count_capped() {
        let mut settings = RunSettings::resolve(&RefreshParams::default(), &RefreshDefaults::default()).unwrap();
        assert_eq!(settings.workers_for(10), None);

        settings.parallel = true;
        assert_eq!(settings.workers_for(1), None);
        assert_eq!(settings.workers_for(10), Some(10));
        assert_eq!(settings.workers_for(100), Some(MAX_DEFAULT_WORKERS));

        settings.max_workers = Some(3);
        assert_eq!(settings.workers_for(100), Some(3));
    }
}
