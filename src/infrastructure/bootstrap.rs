//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::application::pipeline::RefreshPipeline;
use crate::application::quote::QuoteFetcher;
use crate::application::scoring::CriteriaScorer;
use crate::application::throttle::RefreshThrottle;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::MarketDataGateway;

/// Build the gateway-backed quote fetcher from `[quotes]`.
///
/// The fetcher gets a request-level throttle of its own when `[quotes]`
/// configures one.
pub fn build_quote_fetcher(config: &Config, gateway: Arc<dyn MarketDataGateway>) -> Result<QuoteFetcher> {
    let settings = config.quote_settings()?;
    let mut fetcher = QuoteFetcher::new(gateway, Arc::new(CriteriaScorer::new()), settings);
    if let Some(throttle) = config.quotes.throttle()? {
        fetcher = fetcher.with_throttle(Arc::new(RefreshThrottle::new(throttle)));
    }
    Ok(fetcher)
}

/// Wire a refresh pipeline over `gateway`.
pub fn build_pipeline(config: &Config, gateway: Arc<dyn MarketDataGateway>) -> Result<RefreshPipeline> {
    info!(
        gateway = gateway.name(),
        endpoint = %config.gateway.endpoint(),
        client_id = config.gateway.client_id,
        snapshot = config.quotes.use_snapshot_data,
        "Building refresh pipeline"
    );
    let fetcher = build_quote_fetcher(config, gateway)?;
    let defaults = config.refresh_defaults()?;
    Ok(RefreshPipeline::new(defaults, Arc::new(fetcher)))
}
