//! Operator capability surface for inbound adapters.
//!
//! Inputs arrive as raw document text so the port stays transport agnostic:
//! the CLI reads files, another adapter might read a request body.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::RefreshResult;
use crate::error::Result;

/// Summary of the effective configuration for `config show`.
#[derive(Debug, Clone)]
pub struct ConfigView {
    pub gateway_endpoint: String,
    pub use_snapshot_data: bool,
    pub parallel: bool,
    pub max_attempts: u32,
    /// Full effective configuration as a JSON document.
    pub document: Value,
}

/// One operator-initiated refresh run.
#[derive(Debug, Clone, Default)]
pub struct RefreshRequest {
    /// TOML configuration; defaults plus environment when absent.
    pub config_toml: Option<String>,
    /// JSON array of rejected proposal entries.
    pub entries_json: String,
    /// JSON array of recorded quotes for the replay gateway.
    pub quotes_json: String,
    pub spot_price: Option<f64>,
    pub interest_rate: Option<f64>,
    pub parallel: Option<bool>,
    pub max_workers: Option<usize>,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<f64>,
    pub trigger: Option<String>,
}

/// Use-cases exposed to inbound adapters.
#[async_trait]
pub trait OperatorPort: Send + Sync {
    /// Resolve the effective configuration.
    fn show_config(&self, config_toml: Option<&str>) -> Result<ConfigView>;

    /// Refresh the request's entries against its recorded quotes.
    async fn refresh(&self, request: RefreshRequest) -> Result<RefreshResult>;
}
