//! Default proposal builder for rejection entries.
//!
//! Entries look like:
//!
//! ```json
//! {
//!   "strategy": "iron_condor",
//!   "metrics": {"score": 10, "pos": 0.5},
//!   "legs": [{"symbol": "AAA", "expiry": "2025-12-19", "type": "call",
//!             "strike": 420.0, "position": -1}],
//!   "meta": {"symbol": "AAA"}
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::error::DomainError;
use crate::domain::mid::{resolve_leg_mids, resolve_source, ParityContext};
use crate::domain::{MidSource, OptionLeg, ProposalMetrics, Right, StrategyProposal};
use crate::port::ProposalBuilder;

#[derive(Debug, Deserialize)]
struct RejectionEntry {
    strategy: Option<String>,
    symbol: Option<String>,
    #[serde(default)]
    metrics: BTreeMap<String, Value>,
    legs: Option<Vec<EntryLeg>>,
    meta: Option<EntryMeta>,
}

#[derive(Debug, Deserialize)]
struct EntryMeta {
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntryLeg {
    symbol: Option<String>,
    expiry: Option<Value>,
    strike: Option<f64>,
    #[serde(rename = "type", alias = "right")]
    right: Option<String>,
    #[serde(default = "default_position")]
    position: f64,
    bid: Option<f64>,
    ask: Option<f64>,
    last: Option<f64>,
    close: Option<f64>,
    model: Option<f64>,
    iv: Option<f64>,
    delta: Option<f64>,
    gamma: Option<f64>,
    vega: Option<f64>,
    theta: Option<f64>,
    mid: Option<f64>,
    mid_source: Option<String>,
    mid_fallback: Option<String>,
}

const fn default_position() -> f64 {
    1.0
}

/// Builds proposals from rejection entries and resolves their build-time
/// mids.
#[derive(Debug, Clone, Copy)]
pub struct EntryProposalBuilder {
    parity: ParityContext,
}

impl EntryProposalBuilder {
    pub const fn new(parity: ParityContext) -> Self {
        Self { parity }
    }

    fn leg(raw: EntryLeg, fallback_symbol: Option<&str>) -> Result<OptionLeg, DomainError> {
        let symbol = raw
            .symbol
            .as_deref()
            .or(fallback_symbol)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(DomainError::EmptySymbol)?;
        let expiry = match raw.expiry {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(DomainError::InvalidExpiry {
                    value: other.to_string(),
                })
            }
            None => return Err(missing("expiry")),
        };
        let strike = raw.strike.ok_or_else(|| missing("strike"))?;
        if !(strike.is_finite() && strike > 0.0) {
            return Err(DomainError::NonPositiveStrike { strike });
        }
        let right = Right::parse(raw.right.as_deref().ok_or_else(|| missing("type"))?)?;
        if !raw.position.is_finite() || raw.position.fract() != 0.0 {
            return Err(DomainError::MalformedEntry {
                reason: format!("position {} is not a whole number", raw.position),
            });
        }

        let mut leg = OptionLeg::new(symbol, expiry, strike, right, raw.position as i64);
        leg.bid = raw.bid;
        leg.ask = raw.ask;
        leg.last = raw.last;
        leg.close = raw.close;
        leg.model = raw.model;
        leg.iv = raw.iv;
        leg.delta = raw.delta;
        leg.gamma = raw.gamma;
        leg.vega = raw.vega;
        leg.theta = raw.theta;
        leg.mid = raw.mid;
        leg.mid_source = resolve_source(raw.mid_source.as_deref(), raw.mid_fallback.as_deref());
        leg.mid_fallback = raw.mid_fallback;
        Ok(leg)
    }
}

impl ProposalBuilder for EntryProposalBuilder {
    fn build(&self, entry: &Value) -> Result<StrategyProposal, DomainError> {
        let entry: RejectionEntry =
            serde_json::from_value(entry.clone()).map_err(|err| DomainError::MalformedEntry {
                reason: err.to_string(),
            })?;

        let strategy = entry
            .strategy
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| missing("strategy"))?;
        let raw_legs = entry.legs.ok_or_else(|| missing("legs"))?;
        if raw_legs.is_empty() {
            return Err(DomainError::EmptyLegs);
        }

        let entry_symbol = entry
            .meta
            .and_then(|meta| meta.symbol)
            .or(entry.symbol)
            .filter(|s| !s.trim().is_empty());
        let mut legs = raw_legs
            .into_iter()
            .map(|raw| Self::leg(raw, entry_symbol.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;
        resolve_leg_mids(&mut legs, &self.parity);

        let symbol = entry_symbol.unwrap_or_else(|| legs[0].symbol.clone());
        let mut metrics = ProposalMetrics::default();
        for (name, value) in &entry.metrics {
            metrics.set(name, value.as_f64());
        }

        Ok(StrategyProposal::new(strategy, symbol, legs, metrics))
    }
}

/// Best-effort underlying symbol of a raw entry, for correlating outcomes of
/// entries that never became proposals.
#[must_use]
pub fn entry_symbol(entry: &Value) -> String {
    let from_meta = entry.pointer("/meta/symbol").and_then(Value::as_str);
    let from_leg = entry.pointer("/legs/0/symbol").and_then(Value::as_str);
    let from_entry = entry.get("symbol").and_then(Value::as_str);
    from_meta
        .or(from_entry)
        .or(from_leg)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn missing(field: &str) -> DomainError {
    DomainError::MissingField {
        field: field.to_string(),
    }
}

/// Count of legs resting on each untrusted source, for build-time logging.
#[must_use]
pub fn preview_sources(proposal: &StrategyProposal) -> usize {
    proposal
        .fallback_summary
        .iter()
        .filter(|(source, _)| !MidSource::is_trusted(**source))
        .map(|(_, count)| count)
        .sum()
}
