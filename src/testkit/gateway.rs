//! Scripted [`MarketDataGateway`] for quote fetcher tests.
//!
//! Each contract gets a list of responses; the n-th market data request for
//! that contract plays the n-th response (the last one repeats). Shared
//! counters let tests assert how the fetcher drove the session.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::{OptionContract, OptionLeg};
use crate::error::{Error, Result};
use crate::port::{
    GatewaySession, MarketDataGateway, MarketDataRequest, OptionGreeks, PriceField, RequestId,
    TickUpdate,
};

/// What one market data request answers with.
#[derive(Debug, Clone)]
pub enum Response {
    /// Deliver these ticks, then close the stream.
    Ticks(Vec<TickUpdate>),
    /// Deliver nothing and keep the stream open until cancelled.
    Silent,
    /// Refuse the request outright.
    Refuse(String),
}

impl Response {
    /// Two-sided quote with greeks, closed by a snapshot end.
    pub fn quote(bid: f64, ask: f64) -> Self {
        Self::Ticks(vec![
            TickUpdate::Price {
                field: PriceField::Bid,
                value: bid,
            },
            TickUpdate::Price {
                field: PriceField::Ask,
                value: ask,
            },
            TickUpdate::Greeks(OptionGreeks {
                iv: Some(0.25),
                delta: Some(0.3),
                ..OptionGreeks::default()
            }),
            TickUpdate::SnapshotEnd,
        ])
    }

    /// Only a last trade price.
    pub fn last_only(last: f64) -> Self {
        Self::Ticks(vec![
            TickUpdate::Price {
                field: PriceField::Last,
                value: last,
            },
            TickUpdate::SnapshotEnd,
        ])
    }
}

/// Call counters shared between a gateway and its sessions.
#[derive(Debug, Default)]
pub struct GatewayCounters {
    pub connects: AtomicU32,
    pub disconnects: AtomicU32,
    pub qualifies: AtomicU32,
    pub requests: AtomicU32,
    pub cancels: AtomicU32,
}

impl GatewayCounters {
    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> u32 {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn qualifies(&self) -> u32 {
        self.qualifies.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> u32 {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct Script {
    responses: Vec<Response>,
    played: usize,
}

impl Script {
    fn next(&mut self) -> Response {
        let index = self.played.min(self.responses.len().saturating_sub(1));
        self.played += 1;
        self.responses.get(index).cloned().unwrap_or(Response::Silent)
    }
}

/// Gateway answering from per-contract scripts.
pub struct ScriptedGateway {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    connect_failures: Mutex<VecDeque<Error>>,
    connect_delay: Duration,
    qualify: QualifyMode,
    counters: Arc<GatewayCounters>,
}

/// How `qualify` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualifyMode {
    /// Fill exchange, trading class and contract id.
    Fill,
    /// Fail every lookup.
    Fail,
    /// Never answer.
    Hang,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(HashMap::new())),
            connect_failures: Mutex::new(VecDeque::new()),
            connect_delay: Duration::ZERO,
            qualify: QualifyMode::Fill,
            counters: Arc::new(GatewayCounters::default()),
        }
    }

    /// Script the responses for `leg`'s contract.
    ///
    /// # Panics
    ///
    /// Panics if `leg` cannot be turned into a contract.
    pub fn with_script(self, leg: &OptionLeg, responses: Vec<Response>) -> Self {
        let key = OptionContract::from_leg(leg)
            .map(|contract| contract.key())
            .unwrap_or_else(|e| panic!("unscriptable leg {}: {e}", leg.label()));
        self.scripts.lock().insert(
            key,
            Script {
                responses,
                played: 0,
            },
        );
        self
    }

    /// Fail the next `errors.len()` connects with these errors.
    pub fn with_connect_failures(self, errors: Vec<Error>) -> Self {
        *self.connect_failures.lock() = errors.into();
        self
    }

    /// Delay every connect by `delay`.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn with_qualify(mut self, mode: QualifyMode) -> Self {
        self.qualify = mode;
        self
    }

    pub fn counters(&self) -> Arc<GatewayCounters> {
        Arc::clone(&self.counters)
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataGateway for ScriptedGateway {
    async fn connect(&self) -> Result<Box<dyn GatewaySession>> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if let Some(error) = self.connect_failures.lock().pop_front() {
            return Err(error);
        }
        Ok(Box::new(ScriptedSession {
            scripts: Arc::clone(&self.scripts),
            qualify: self.qualify,
            counters: Arc::clone(&self.counters),
            open: HashMap::new(),
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedSession {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    qualify: QualifyMode,
    counters: Arc<GatewayCounters>,
    /// Senders of silent streams, kept alive until cancelled.
    open: HashMap<RequestId, Option<mpsc::Sender<TickUpdate>>>,
}

#[async_trait]
impl GatewaySession for ScriptedSession {
    async fn qualify(&mut self, contract: &OptionContract) -> Result<OptionContract> {
        self.counters.qualifies.fetch_add(1, Ordering::SeqCst);
        match self.qualify {
            QualifyMode::Fill => {
                let mut qualified = contract.clone();
                qualified.exchange = Some("SMART".to_string());
                qualified.trading_class = Some(contract.symbol.clone());
                qualified.con_id = Some(1);
                Ok(qualified)
            }
            QualifyMode::Fail => Err(Error::Gateway(format!("no security definition for {contract}"))),
            QualifyMode::Hang => std::future::pending().await,
        }
    }

    async fn request_market_data(
        &mut self,
        req_id: RequestId,
        contract: &OptionContract,
        _request: &MarketDataRequest,
    ) -> Result<mpsc::Receiver<TickUpdate>> {
        self.counters.requests.fetch_add(1, Ordering::SeqCst);
        if self.open.contains_key(&req_id) {
            return Err(Error::Gateway(format!("duplicate request id {req_id}")));
        }

        let response = self
            .scripts
            .lock()
            .get_mut(&contract.key())
            .map_or_else(
                || Response::Ticks(vec![TickUpdate::Error {
                    code: 200,
                    message: format!("no security definition for {contract}"),
                }]),
                Script::next,
            );

        match response {
            Response::Refuse(message) => Err(Error::Gateway(message)),
            Response::Silent => {
                let (tx, rx) = mpsc::channel(1);
                self.open.insert(req_id, Some(tx));
                Ok(rx)
            }
            Response::Ticks(ticks) => {
                let (tx, rx) = mpsc::channel(ticks.len().max(1));
                for tick in ticks {
                    // Capacity covers every tick.
                    let _ = tx.try_send(tick);
                }
                self.open.insert(req_id, None);
                Ok(rx)
            }
        }
    }

    async fn cancel_market_data(&mut self, req_id: RequestId) {
        self.counters.cancels.fetch_add(1, Ordering::SeqCst);
        self.open.remove(&req_id);
    }

    async fn disconnect(&mut self) {
        self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
        self.open.clear();
    }
}
