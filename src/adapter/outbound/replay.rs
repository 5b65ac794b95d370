//! Replay gateway backed by recorded quotes.
//!
//! Serves a fixed set of quotes through the [`MarketDataGateway`] port, so a
//! refresh can run end to end without a live venue. Quotes are keyed by
//! symbol, expiry, strike and right; an unknown contract answers the way a
//! venue does, with a request-scoped error.
//!
//! # File format
//!
//! ```json
//! [
//!   {"symbol": "AAA", "expiry": "2025-12-19", "strike": 420.0, "right": "call",
//!    "bid": 1.10, "ask": 1.25, "delta": 0.31, "exchange": "SMART"}
//! ]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::contract::{contract_key, normalize_expiry};
use crate::domain::{OptionContract, Right};
use crate::error::{Error, Result};
use crate::port::{
    GatewaySession, MarketDataGateway, MarketDataRequest, OptionGreeks, PriceField, RequestId,
    TickUpdate,
};

/// Venue error code for an unknown contract.
const NO_SECURITY_DEFINITION: i32 = 200;

/// One recorded option quote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedQuote {
    pub symbol: String,
    pub expiry: String,
    pub strike: f64,
    pub right: String,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
    pub close: Option<f64>,
    pub model: Option<f64>,
    pub iv: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
    pub theta: Option<f64>,
    pub exchange: Option<String>,
    pub trading_class: Option<String>,
    pub con_id: Option<i64>,
}

impl RecordedQuote {
    fn key(&self) -> Result<String> {
        let expiry = normalize_expiry(&self.expiry)?;
        let right = Right::parse(&self.right)?;
        Ok(contract_key(&self.symbol, &expiry, self.strike, right))
    }

    fn ticks(&self, snapshot: bool) -> Vec<TickUpdate> {
        let prices = [
            (PriceField::Bid, self.bid),
            (PriceField::Ask, self.ask),
            (PriceField::Last, self.last),
            (PriceField::Close, self.close),
        ];
        let mut ticks: Vec<TickUpdate> = prices
            .into_iter()
            .filter_map(|(field, value)| value.map(|value| TickUpdate::Price { field, value }))
            .collect();

        let greeks = OptionGreeks {
            iv: self.iv,
            delta: self.delta,
            gamma: self.gamma,
            vega: self.vega,
            theta: self.theta,
            model_price: self.model,
        };
        if greeks != OptionGreeks::default() {
            ticks.push(TickUpdate::Greeks(greeks));
        }
        if snapshot {
            ticks.push(TickUpdate::SnapshotEnd);
        }
        ticks
    }
}

/// Gateway that answers from recorded quotes.
#[derive(Debug, Clone, Default)]
pub struct ReplayGateway {
    quotes: Arc<HashMap<String, RecordedQuote>>,
    latency: Duration,
}

impl ReplayGateway {
    /// Index `quotes` by contract key.
    ///
    /// # Errors
    ///
    /// Returns a domain error for a quote with a malformed expiry or right.
    pub fn from_quotes(quotes: Vec<RecordedQuote>) -> Result<Self> {
        let mut index = HashMap::with_capacity(quotes.len());
        for quote in quotes {
            index.insert(quote.key()?, quote);
        }
        Ok(Self {
            quotes: Arc::new(index),
            latency: Duration::ZERO,
        })
    }

    /// Load quotes from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse quotes from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not an array of recorded quotes.
    pub fn from_json(content: &str) -> Result<Self> {
        let quotes: Vec<RecordedQuote> = serde_json::from_str(content)?;
        Self::from_quotes(quotes)
    }

    /// Delay every tick delivery by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of recorded contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

#[async_trait]
impl MarketDataGateway for ReplayGateway {
    async fn connect(&self) -> Result<Box<dyn GatewaySession>> {
        Ok(Box::new(ReplaySession {
            quotes: Arc::clone(&self.quotes),
            latency: self.latency,
            active: HashSet::new(),
        }))
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

/// One replay session. Tracks live request ids like a venue would.
struct ReplaySession {
    quotes: Arc<HashMap<String, RecordedQuote>>,
    latency: Duration,
    active: HashSet<RequestId>,
}

#[async_trait]
impl GatewaySession for ReplaySession {
    async fn qualify(&mut self, contract: &OptionContract) -> Result<OptionContract> {
        let quote = self
            .quotes
            .get(&contract.key())
            .ok_or_else(|| Error::Gateway(format!("no security definition for {contract}")))?;

        let mut qualified = contract.clone();
        qualified.exchange = quote.exchange.clone().or(qualified.exchange);
        qualified.trading_class = quote.trading_class.clone().or(qualified.trading_class);
        qualified.con_id = quote.con_id.or(qualified.con_id);
        Ok(qualified)
    }

    async fn request_market_data(
        &mut self,
        req_id: RequestId,
        contract: &OptionContract,
        request: &MarketDataRequest,
    ) -> Result<mpsc::Receiver<TickUpdate>> {
        if !self.active.insert(req_id) {
            return Err(Error::Gateway(format!("duplicate request id {req_id}")));
        }

        let ticks = match self.quotes.get(&contract.key()) {
            Some(quote) => quote.ticks(request.snapshot),
            None => vec![TickUpdate::Error {
                code: NO_SECURITY_DEFINITION,
                message: format!("no security definition for {contract}"),
            }],
        };
        debug!(req_id, contract = %contract, ticks = ticks.len(), "Replaying market data");

        let (tx, rx) = mpsc::channel(ticks.len().max(1));
        let latency = self.latency;
        tokio::spawn(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            for tick in ticks {
                if tx.send(tick).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn cancel_market_data(&mut self, req_id: RequestId) {
        self.active.remove(&req_id);
    }

    async fn disconnect(&mut self) {
        self.active.clear();
    }
}
