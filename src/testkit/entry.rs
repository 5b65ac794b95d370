//! Builders for rejection entries, legs and refresh requests.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::domain::{AcceptanceCriteria, MidSource, OptionLeg, ProposalMetrics, Right, StrategyProposal};
use crate::port::SnapshotRequest;

/// Single-leg iron condor entry on `AAA` with score 10 and pos 0.5.
pub fn condor_entry() -> Value {
    json!({
        "strategy": "iron_condor",
        "metrics": {"score": 10, "pos": 0.5},
        "legs": [{
            "symbol": "AAA",
            "expiry": "2025-12-19",
            "type": "call",
            "strike": 420.0,
            "position": -1
        }]
    })
}

/// Entry with one short call on `symbol`.
pub fn entry(symbol: &str, expiry: &str, strike: f64) -> Value {
    json!({
        "strategy": "short_call",
        "metrics": {"score": 5},
        "meta": {"symbol": symbol},
        "legs": [{
            "symbol": symbol,
            "expiry": expiry,
            "type": "call",
            "strike": strike,
            "position": -1
        }]
    })
}

/// `n` distinct entries, emitted in reverse of their sorted order.
pub fn shuffled_entries(n: usize) -> Vec<Value> {
    (0..n)
        .rev()
        .map(|i| entry(&format!("S{:02}", i % 7), "2025-12-19", 100.0 + i as f64))
        .collect()
}

/// Entry without a `legs` field.
pub fn legless_entry() -> Value {
    json!({"strategy": "iron_condor", "metrics": {"score": 10}})
}

/// Two-leg bull put spread on `AAA`, quoted and priced at true mids.
pub fn vertical_legs() -> Vec<OptionLeg> {
    let mut short = OptionLeg::new("AAA", "20251219", 400.0, Right::Put, -1);
    short.bid = Some(2.0);
    short.ask = Some(2.2);
    short.mid = Some(2.1);
    short.mid_source = Some(MidSource::True);
    let mut long = OptionLeg::new("AAA", "20251219", 395.0, Right::Put, 1);
    long.bid = Some(1.0);
    long.ask = Some(1.1);
    long.mid = Some(1.05);
    long.mid_source = Some(MidSource::True);
    vec![short, long]
}

/// Proposal over `legs` with `score` set.
pub fn proposal(legs: Vec<OptionLeg>, score: f64) -> StrategyProposal {
    StrategyProposal::new(
        "bull_put",
        "AAA",
        legs,
        ProposalMetrics {
            score: Some(score),
            ..ProposalMetrics::default()
        },
    )
}

/// Snapshot request with default criteria.
pub fn snapshot_request(timeout: Duration) -> SnapshotRequest {
    SnapshotRequest {
        criteria: Arc::new(AcceptanceCriteria::default()),
        spot_price: Some(410.0),
        interest_rate: 0.05,
        timeout,
        trigger: "test".to_string(),
    }
}
