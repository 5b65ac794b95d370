//! Per-leg quote acquisition against a market-data gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use super::{QuoteSettings, RequestRegistry, SessionGuard};
use crate::application::throttle::RefreshThrottle;
use crate::domain::{
    finite, DeltaLog, Governance, LegDelta, OptionContract, OptionLeg, QuoteSnapshot,
    SnapshotResult, StrategyProposal,
};
use crate::port::{
    FetchError, MarketDataGateway, MarketDataRequest, OptionGreeks, PriceField, ProposalScorer,
    ScoringContext, SnapshotFetcher, SnapshotRequest, TickUpdate,
};

/// Default [`SnapshotFetcher`]: live quotes through a [`MarketDataGateway`].
///
/// Every call opens its own session and closes it before returning. Legs are
/// refreshed one after another; a leg that cannot be quoted is flagged
/// `missing_edge` without aborting the others.
pub struct QuoteFetcher {
    gateway: Arc<dyn MarketDataGateway>,
    scorer: Arc<dyn ProposalScorer>,
    settings: QuoteSettings,
    throttle: Option<Arc<RefreshThrottle>>,
}

impl QuoteFetcher {
    pub fn new(
        gateway: Arc<dyn MarketDataGateway>,
        scorer: Arc<dyn ProposalScorer>,
        settings: QuoteSettings,
    ) -> Self {
        Self {
            gateway,
            scorer,
            settings,
            throttle: None,
        }
    }

    /// Gate every quote request through `throttle`.
    ///
    /// Use a throttle of its own, not the pipeline's: the pipeline already
    /// holds a permit of its throttle for the whole fetch.
    #[must_use]
    pub fn with_throttle(mut self, throttle: Arc<RefreshThrottle>) -> Self {
        self.throttle = Some(throttle);
        self
    }

    pub fn settings(&self) -> &QuoteSettings {
        &self.settings
    }

    /// Refresh every leg of `proposal`, then rescore it.
    ///
    /// # Errors
    ///
    /// Only session setup fails the call: [`FetchError::Timeout`] when the
    /// gateway does not connect within `request.timeout`,
    /// [`FetchError::Upstream`] when it refuses.
    pub async fn refresh(
        &self,
        mut proposal: StrategyProposal,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResult, FetchError> {
        let mut session = SessionGuard::open(
            self.gateway.as_ref(),
            self.settings.connect_deadline(request.timeout),
        )
        .await?;
        let registry = RequestRegistry::new();
        let metrics_before = proposal.metrics;

        let mut delta_log = DeltaLog::default();
        let mut missing_quotes = Vec::new();

        for leg in &mut proposal.legs {
            let label = leg.label();
            match self.refresh_leg(&mut session, &registry, leg, request.timeout).await {
                Ok(delta) => delta_log.legs.push(delta),
                Err(reason) => {
                    warn!(leg = %label, reason = %reason, "No usable quote for leg");
                    leg.mark_missing();
                    missing_quotes.push(label);
                }
            }
        }

        session.close().await;

        proposal.refresh_provenance();
        let ctx = ScoringContext {
            criteria: &request.criteria,
            spot_price: request.spot_price,
            interest_rate: request.interest_rate,
        };
        let scoring = self.scorer.score(&mut proposal, &ctx);
        proposal.reasons.clone_from(&scoring.reasons);
        delta_log.capture_metrics(&metrics_before, &proposal.metrics);

        for change in delta_log.changed_metrics() {
            debug!(
                strategy = %proposal.strategy,
                metric = %change.metric,
                before = ?change.before,
                after = ?change.after,
                "Metric changed after refresh"
            );
        }

        let accepted = scoring.is_accepted();
        info!(
            strategy = %proposal.strategy,
            symbol = %proposal.symbol,
            legs = proposal.legs.len(),
            missing = missing_quotes.len(),
            accepted,
            "Proposal refreshed"
        );

        let governance = Governance::derive(&proposal, &request.trigger);
        Ok(SnapshotResult {
            proposal,
            reasons: scoring.reasons,
            accepted,
            missing_quotes,
            delta_log,
            governance,
        })
    }

    /// Quote one leg. Returns the mid delta, or why the leg stays unquoted.
    async fn refresh_leg(
        &self,
        session: &mut SessionGuard,
        registry: &RequestRegistry,
        leg: &mut OptionLeg,
        deadline: Duration,
    ) -> Result<LegDelta, String> {
        let mut contract = OptionContract::from_leg(leg).map_err(|err| err.to_string())?;
        let mut budget = self.settings.attempts_per_leg();

        if !contract.is_qualified() {
            match self.qualify(session, &contract).await {
                Some(qualified) => contract = qualified,
                None if self.settings.enrichment_consumes_retry => budget -= 1,
                None => {}
            }
        }

        let mut last_failure = String::from("contract lookup used the whole request budget");
        for attempt in 1..=budget {
            match self.request_quote(session, registry, &contract, deadline).await {
                Ok(snapshot) if snapshot.has_two_sided_quote() => {
                    let before = leg.mid;
                    let change = leg.apply_snapshot(&snapshot, Utc::now());
                    debug!(
                        contract = %contract,
                        attempt,
                        before = ?before,
                        after = ?leg.mid,
                        change = ?change,
                        "Leg repriced"
                    );
                    return Ok(LegDelta {
                        leg: leg.label(),
                        before,
                        after: leg.mid,
                        change,
                    });
                }
                Ok(_) => last_failure = "bid/ask not both available".to_string(),
                Err(reason) => last_failure = reason,
            }

            debug!(contract = %contract, attempt, budget, reason = %last_failure, "Quote attempt failed");
            if attempt < budget && !self.settings.quote_retry_delay.is_zero() {
                sleep(self.settings.quote_retry_delay).await;
            }
        }

        Err(last_failure)
    }

    /// Ask the gateway for routing metadata; `None` keeps the original.
    async fn qualify(
        &self,
        session: &mut SessionGuard,
        contract: &OptionContract,
    ) -> Option<OptionContract> {
        match timeout(self.settings.contract_lookup_timeout, session.qualify(contract)).await {
            Ok(Ok(qualified)) => Some(qualified),
            Ok(Err(err)) => {
                debug!(contract = %contract, error = %err, "Contract lookup failed, using unqualified contract");
                None
            }
            Err(_) => {
                debug!(contract = %contract, "Contract lookup timed out, using unqualified contract");
                None
            }
        }
    }

    /// One request/collect/cancel round trip.
    async fn request_quote(
        &self,
        session: &mut SessionGuard,
        registry: &RequestRegistry,
        contract: &OptionContract,
        deadline: Duration,
    ) -> Result<QuoteSnapshot, String> {
        let _permit = match &self.throttle {
            Some(throttle) => Some(throttle.acquire().await),
            None => None,
        };

        let request = MarketDataRequest {
            snapshot: self.settings.use_snapshot_data,
            generic_ticks: if self.settings.use_snapshot_data {
                String::new()
            } else {
                self.settings.generic_ticks.clone()
            },
        };
        let guard = registry.register(contract.key());
        let expires = deadline_after(deadline);

        let outcome = match timeout_at(
            expires,
            session.request_market_data(guard.id(), contract, &request),
        )
        .await
        {
            Ok(Ok(mut ticks)) => collect_ticks(&mut ticks, expires).await,
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(format!("market data request not accepted within {deadline:?}")),
        };

        session.cancel_market_data(guard.id()).await;
        outcome
    }
}

#[async_trait]
impl SnapshotFetcher for QuoteFetcher {
    async fn fetch(
        &self,
        proposal: StrategyProposal,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResult, FetchError> {
        self.refresh(proposal, request).await
    }
}

/// Roughly 30 years; stands in for a deadline the clock cannot represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `deadline` from now, saturating at [`FAR_FUTURE`].
fn deadline_after(deadline: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(deadline)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Fold ticks into a snapshot until the quote is complete, the gateway
/// signals the end, or `expires` passes.
///
/// Streaming requests wait for greeks as well as both sides of the book;
/// whatever arrived by the deadline is returned.
async fn collect_ticks(
    ticks: &mut mpsc::Receiver<TickUpdate>,
    expires: Instant,
) -> Result<QuoteSnapshot, String> {
    let mut snapshot = QuoteSnapshot::default();
    let mut has_greeks = false;

    loop {
        match timeout_at(expires, ticks.recv()).await {
            Ok(Some(TickUpdate::Price { field, value })) => apply_price(&mut snapshot, field, value),
            Ok(Some(TickUpdate::Greeks(greeks))) => {
                apply_greeks(&mut snapshot, &greeks);
                has_greeks = true;
            }
            Ok(Some(TickUpdate::Error { code, message })) => {
                return Err(format!("gateway error {code}: {message}"));
            }
            Ok(Some(TickUpdate::SnapshotEnd) | None) | Err(_) => break,
        }

        if has_greeks && snapshot.has_two_sided_quote() {
            break;
        }
    }

    Ok(snapshot)
}

fn apply_price(snapshot: &mut QuoteSnapshot, field: PriceField, value: f64) {
    let Some(value) = finite(Some(value)) else {
        return;
    };
    let slot = match field {
        PriceField::Bid => &mut snapshot.bid,
        PriceField::Ask => &mut snapshot.ask,
        PriceField::Last => &mut snapshot.last,
        PriceField::Close => &mut snapshot.close,
    };
    *slot = Some(value);
}

fn apply_greeks(snapshot: &mut QuoteSnapshot, greeks: &OptionGreeks) {
    let pairs = [
        (&mut snapshot.iv, greeks.iv),
        (&mut snapshot.delta, greeks.delta),
        (&mut snapshot.gamma, greeks.gamma),
        (&mut snapshot.vega, greeks.vega),
        (&mut snapshot.theta, greeks.theta),
        (&mut snapshot.model, greeks.model_price),
    ];
    for (slot, value) in pairs {
        if let Some(value) = finite(value) {
            *slot = Some(value);
        }
    }
}
