//! Operator implementation backing inbound adapters.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::adapter::outbound::replay::ReplayGateway;
use crate::application::pipeline::RefreshParams;
use crate::domain::RefreshResult;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::port::{ConfigView, OperatorPort, RefreshRequest};

/// Trigger label recorded for operator-initiated runs.
const OPERATOR_TRIGGER: &str = "cli";

/// Operator over the replay gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operator;

impl Operator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn resolve_config(config_toml: Option<&str>) -> Result<Config> {
    match config_toml {
        Some(content) => Config::parse_toml(content),
        None => Config::from_env(),
    }
}

fn params(request: &RefreshRequest) -> RefreshParams {
    RefreshParams {
        spot_price: request.spot_price,
        interest_rate: request.interest_rate,
        timeout_secs: request.timeout_secs,
        max_attempts: request.max_attempts,
        parallel: request.parallel,
        max_workers: request.max_workers,
        trigger: Some(
            request
                .trigger
                .clone()
                .unwrap_or_else(|| OPERATOR_TRIGGER.to_string()),
        ),
        ..RefreshParams::default()
    }
}

#[async_trait]
impl OperatorPort for Operator {
    fn show_config(&self, config_toml: Option<&str>) -> Result<ConfigView> {
        let config = resolve_config(config_toml)?;
        Ok(ConfigView {
            gateway_endpoint: config.gateway.endpoint(),
            use_snapshot_data: config.quotes.use_snapshot_data,
            parallel: config.refresh.parallel,
            max_attempts: config.refresh.max_attempts,
            document: serde_json::to_value(&config)?,
        })
    }

    async fn refresh(&self, request: RefreshRequest) -> Result<RefreshResult> {
        let config = resolve_config(request.config_toml.as_deref())?;
        config.init_logging();

        let entries: Vec<Value> = serde_json::from_str(&request.entries_json)?;
        let gateway = ReplayGateway::from_json(&request.quotes_json)?;
        info!(
            contracts = gateway.len(),
            entries = entries.len(),
            "Loaded replay inputs"
        );

        let pipeline = bootstrap::build_pipeline(&config, Arc::new(gateway))?;
        Ok(pipeline.refresh(entries, params(&request)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_config_reflects_toml() {
        let view = Operator::new()
            .show_config(Some("[refresh]\nparallel = true\nmax_attempts = 3\n"))
            .unwrap();
        assert!(view.parallel);
        assert_eq!(view.max_attempts, 3);
        assert_eq!(view.document["refresh"]["max_attempts"], 3);
    }

    #[test]
    fn show_config_rejects_bad_toml() {
        assert!(Operator::new().show_config(Some("[refresh\n")).is_err());
    }

    #[tokio::test]
    async fn refresh_rejects_malformed_entries() {
        let request = RefreshRequest {
            config_toml: Some(String::new()),
            entries_json: "{not json".into(),
            quotes_json: "[]".into(),
            ..RefreshRequest::default()
        };
        assert!(Operator::new().refresh(request).await.is_err());
    }

    #[tokio::test]
    async fn refresh_with_no_entries_is_empty() {
        let request = RefreshRequest {
            config_toml: Some(String::new()),
            entries_json: "[]".into(),
            quotes_json: "[]".into(),
            ..RefreshRequest::default()
        };
        let result = Operator::new().refresh(request).await.unwrap();
        assert_eq!(result.stats.total, 0);
    }
}
