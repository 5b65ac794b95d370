//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; the runtime keys listed on each
//! section (e.g. `MARKET_DATA_TIMEOUT`) override file values when set in the
//! environment.
//!
//! # Example
//!
//! ```no_run
//! use quote_refresh::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::gateway::GatewayConfig;
use super::logging::LoggingConfig;
use super::quotes::QuotesConfig;
use super::refresh::RefreshConfig;
use crate::application::pipeline::RefreshDefaults;
use crate::application::quote::QuoteSettings;
use crate::domain::AcceptanceCriteria;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Every section is optional; a missing section takes its defaults. Load from
/// a TOML file with [`Config::load`], parse text with [`Config::parse_toml`],
/// or start from defaults with [`Config::from_env`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pipeline defaults: deadlines, retries, concurrency.
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Market-data gateway endpoint.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Per-leg quote request behaviour.
    #[serde(default)]
    pub quotes: QuotesConfig,

    /// Acceptance criteria, including the spread policy under
    /// `[criteria.spread]`.
    #[serde(default)]
    pub criteria: AcceptanceCriteria,
}

impl Config {
    /// Parse configuration from TOML content, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, an environment override
    /// cannot be parsed, or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or for any reason listed
    /// on [`parse_toml`](Self::parse_toml).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment override is malformed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply runtime overrides looked up through `lookup`.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the key whose value
    /// does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> std::result::Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(v) = get("MARKET_DATA_TIMEOUT") {
            self.refresh.timeout_secs = parse("MARKET_DATA_TIMEOUT", &v)?;
        }
        if let Some(v) = get("PIPELINE_REFRESH_ATTEMPTS") {
            self.refresh.max_attempts = parse("PIPELINE_REFRESH_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("PIPELINE_REFRESH_RETRY_DELAY") {
            self.refresh.retry_delay_secs = parse("PIPELINE_REFRESH_RETRY_DELAY", &v)?;
        }
        if let Some(v) = get("PIPELINE_REFRESH_PARALLEL") {
            self.refresh.parallel = parse_flag("PIPELINE_REFRESH_PARALLEL", &v)?;
        }
        if let Some(v) = get("PIPELINE_REFRESH_MAX_WORKERS") {
            self.refresh.max_workers = Some(parse("PIPELINE_REFRESH_MAX_WORKERS", &v)?);
        }
        if let Some(v) = get("PIPELINE_REFRESH_MAX_INFLIGHT") {
            self.refresh.max_inflight = Some(parse("PIPELINE_REFRESH_MAX_INFLIGHT", &v)?);
        }
        if let Some(v) = get("PIPELINE_REFRESH_MIN_INTERVAL") {
            self.refresh.min_interval_secs = parse("PIPELINE_REFRESH_MIN_INTERVAL", &v)?;
        }
        if let Some(v) = get("IB_USE_SNAPSHOT_DATA") {
            self.quotes.use_snapshot_data = parse_flag("IB_USE_SNAPSHOT_DATA", &v)?;
        }
        if let Some(v) = get("IB_MAX_QUOTE_RETRIES") {
            self.quotes.max_quote_retries = parse("IB_MAX_QUOTE_RETRIES", &v)?;
        }
        if let Some(v) = get("IB_QUOTE_RETRY_DELAY") {
            self.quotes.quote_retry_delay_secs = parse("IB_QUOTE_RETRY_DELAY", &v)?;
        }
        if let Some(v) = get("MKT_GENERIC_TICKS") {
            self.quotes.generic_ticks = v.trim().to_string();
        }
        if let Some(v) = get("IB_HOST") {
            self.gateway.host = v.trim().to_string();
        }
        if let Some(v) = get("IB_PORT") {
            self.gateway.port = parse("IB_PORT", &v)?;
        }
        if let Some(v) = get("IB_CLIENT_ID") {
            self.gateway.client_id = parse("IB_CLIENT_ID", &v)?;
        }
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first section error found.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "logging.level" });
        }
        if !self.logging.is_known_format() {
            return Err(ConfigError::invalid(
                "logging.format",
                format!("expected 'pretty' or 'json', got '{}'", self.logging.format),
            ));
        }
        self.refresh.validate()?;
        self.gateway.validate()?;
        self.quotes.validate()?;
        Ok(())
    }

    /// Initialize tracing from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Pipeline defaults derived from `[refresh]` and `[criteria]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for malformed durations.
    pub fn refresh_defaults(&self) -> std::result::Result<RefreshDefaults, ConfigError> {
        self.refresh.to_defaults(&self.criteria)
    }

    /// Quote fetcher settings derived from `[quotes]` and `[gateway]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for malformed durations.
    pub fn quote_settings(&self) -> std::result::Result<QuoteSettings, ConfigError> {
        let mut settings = self.quotes.to_settings()?;
        settings.connect_timeout = self.gateway.connect_timeout()?;
        Ok(settings)
    }
}

fn parse<T>(key: &'static str, raw: &str) -> std::result::Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err: T::Err| ConfigError::invalid(key, format!("'{raw}': {err}")))
}

fn parse_flag(key: &'static str, raw: &str) -> std::result::Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, format!("'{raw}' is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config: Config = toml::from_str(
            r#"
            [refresh]
            timeout_secs = 5.0
            parallel = false
            "#,
        )
        .unwrap();

        config
            .apply_overrides(env(&[
                ("MARKET_DATA_TIMEOUT", "2.5"),
                ("PIPELINE_REFRESH_PARALLEL", "yes"),
                ("PIPELINE_REFRESH_MAX_INFLIGHT", "4"),
                ("IB_MAX_QUOTE_RETRIES", "2"),
                ("MKT_GENERIC_TICKS", " 100,106 "),
                ("IB_PORT", "4002"),
                ("IB_HOST", ""),
            ]))
            .unwrap();

        assert!((config.refresh.timeout_secs - 2.5).abs() < f64::EPSILON);
        assert!(config.refresh.parallel);
        assert_eq!(config.refresh.max_inflight, Some(4));
        assert_eq!(config.quotes.max_quote_retries, 2);
        assert_eq!(config.quotes.generic_ticks, "100,106");
        assert_eq!(config.gateway.port, 4002);
        assert_eq!(config.gateway.host, "127.0.0.1");

        let defaults = config.refresh_defaults().unwrap();
        assert_eq!(defaults.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn malformed_override_names_the_key() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("PIPELINE_REFRESH_ATTEMPTS", "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "PIPELINE_REFRESH_ATTEMPTS",
                ..
            }
        ));
    }

    #[test]
    fn spread_policy_lives_under_criteria() {
        let config: Config = toml::from_str(
            r#"
            [criteria]
            max_missing_legs = 1

            [criteria.spread.default]
            name = "default"
            absolute = 0.10
            relative_factor = 0.05

            [[criteria.spread.exceptions]]
            name = "cheap"
            absolute = [{ max_underlying = 50.0, threshold = 0.05 }, { max_underlying = 1e9, threshold = 0.2 }]
            match = { symbols = ["AAA"] }
            "#,
        )
        .unwrap();

        assert_eq!(config.criteria.max_missing_legs, 1);
        assert_eq!(config.criteria.spread.default.relative_factor, Some(0.05));
        assert_eq!(config.criteria.spread.exceptions[0].name, "cheap");
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "logging.format",
                ..
            })
        ));
    }
}
