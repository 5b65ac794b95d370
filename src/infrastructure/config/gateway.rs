//! Market-data gateway connection settings.

use serde::{Deserialize, Serialize};

use std::time::Duration;

use crate::error::ConfigError;

use super::seconds;

fn default_host() -> String {
    "127.0.0.1".into()
}

const fn default_port() -> u16 {
    7497
}

const fn default_client_id() -> i32 {
    0
}

/// `[gateway]` section.
///
/// Environment keys: `IB_HOST`, `IB_PORT`, `IB_CLIENT_ID`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client id presented to the gateway.
    #[serde(default = "default_client_id")]
    pub client_id: i32,
    /// Deadline for opening a session, in seconds. Unset uses each
    /// request's timeout.
    #[serde(default)]
    pub connect_timeout_secs: Option<f64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_id: default_client_id(),
            connect_timeout_secs: None,
        }
    }
}

impl GatewayConfig {
    /// `host:port`, for logs.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "gateway.host" });
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("gateway.port", "must be greater than 0"));
        }
        if self.client_id < 0 {
            return Err(ConfigError::invalid("gateway.client_id", "must be 0 or greater"));
        }
        if self.connect_timeout()?.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::invalid(
                "gateway.connect_timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Session connect deadline, if configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a malformed duration.
    pub fn connect_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.connect_timeout_secs
            .map(|secs| seconds("gateway.connect_timeout_secs", secs))
            .transpose()
    }
}
