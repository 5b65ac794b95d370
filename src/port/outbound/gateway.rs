//! Market-data gateway port.
//!
//! The gateway's wire protocol is not implemented in this crate. Adapters
//! implement [`MarketDataGateway`] to open a [`GatewaySession`], which the
//! quote fetcher drives: qualify a contract, subscribe to ticks under a
//! correlation id, cancel, disconnect.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::OptionContract;
use crate::error::Result;

/// Correlation id for one market-data request within a session.
pub type RequestId = u32;

/// Price fields a gateway can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Bid,
    Ask,
    Last,
    Close,
}

/// Option computation values reported by the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OptionGreeks {
    pub iv: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
    pub theta: Option<f64>,
    pub model_price: Option<f64>,
}

/// One callback delivered for an active request.
#[derive(Debug, Clone, PartialEq)]
pub enum TickUpdate {
    Price { field: PriceField, value: f64 },
    Greeks(OptionGreeks),
    /// The gateway has sent everything it will send for a snapshot request.
    SnapshotEnd,
    /// Request-scoped error reported by the gateway.
    Error { code: i32, message: String },
}

/// How market data should be requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketDataRequest {
    /// One-shot snapshot instead of a streaming subscription.
    pub snapshot: bool,
    /// Comma-separated generic tick list, e.g. `"100,101,106"`.
    pub generic_ticks: String,
}

/// Factory for gateway sessions.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; every concurrent fetch opens its
/// own session from the same gateway.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Open a new session.
    ///
    /// # Errors
    ///
    /// Returns an error when the gateway is unreachable or refuses the
    /// connection.
    async fn connect(&self) -> Result<Box<dyn GatewaySession>>;

    /// Gateway name for logging.
    fn name(&self) -> &'static str;
}

/// An open gateway connection, owned by exactly one fetch.
#[async_trait]
pub trait GatewaySession: Send {
    /// Resolve exchange, trading class and contract id for a contract.
    async fn qualify(&mut self, contract: &OptionContract) -> Result<OptionContract>;

    /// Start market data for `contract` under `req_id`.
    ///
    /// Ticks arrive on the returned channel until the request is cancelled
    /// or the gateway closes it.
    async fn request_market_data(
        &mut self,
        req_id: RequestId,
        contract: &OptionContract,
        request: &MarketDataRequest,
    ) -> Result<mpsc::Receiver<TickUpdate>>;

    /// Stop market data for `req_id`. Must tolerate unknown ids.
    async fn cancel_market_data(&mut self, req_id: RequestId);

    /// Close the session.
    async fn disconnect(&mut self);
}
