//! Results of one quote-refresh attempt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::leg::{finite, LegCompleteness, MidSource};
use super::proposal::{mid_source_histogram, ProposalMetrics, StrategyProposal};

/// Mid change on one leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegDelta {
    pub leg: String,
    pub before: Option<f64>,
    pub after: Option<f64>,
    pub change: Option<f64>,
}

/// Headline metric change across a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub metric: String,
    pub before: Option<f64>,
    pub after: Option<f64>,
    pub change: Option<f64>,
}

/// Before/after record of a refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaLog {
    pub legs: Vec<LegDelta>,
    pub metrics: Vec<MetricDelta>,
}

impl DeltaLog {
    /// Record headline metric changes between two metric sets.
    pub fn capture_metrics(&mut self, before: &ProposalMetrics, after: &ProposalMetrics) {
        self.metrics = ProposalMetrics::HEADLINE
            .iter()
            .map(|name| {
                let b = before.get(name);
                let a = after.get(name);
                MetricDelta {
                    metric: (*name).to_string(),
                    before: b,
                    after: a,
                    change: finite(a).zip(finite(b)).map(|(a, b)| a - b),
                }
            })
            .collect();
    }

    /// Metric deltas that actually changed.
    pub fn changed_metrics(&self) -> impl Iterator<Item = &MetricDelta> {
        self.metrics
            .iter()
            .filter(|delta| delta.before != delta.after)
    }
}

/// Monitoring metadata attached to a refresh result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Governance {
    pub mid_sources: BTreeMap<MidSource, usize>,
    pub needs_refresh: bool,
    /// Mean bid/ask spread as a percentage of mid, over legs that have one.
    pub avg_spread_pct: Option<f64>,
    /// `max_profit / |max_loss|` when both are known.
    pub risk_reward: Option<f64>,
    pub legs: Vec<LegCompleteness>,
    /// What initiated the refresh.
    pub trigger: String,
}

impl Governance {
    /// Derive governance metadata from a refreshed proposal.
    #[must_use]
    pub fn derive(proposal: &StrategyProposal, trigger: &str) -> Self {
        let spreads: Vec<f64> = proposal
            .legs
            .iter()
            .filter_map(|leg| leg.spread_pct())
            .filter(|pct| pct.is_finite())
            .collect();
        let avg_spread_pct =
            (!spreads.is_empty()).then(|| spreads.iter().sum::<f64>() / spreads.len() as f64);

        let risk_reward = finite(proposal.metrics.max_profit)
            .zip(finite(proposal.metrics.max_loss).map(f64::abs).filter(|l| *l > 0.0))
            .map(|(profit, loss)| profit / loss);

        Self {
            mid_sources: mid_source_histogram(&proposal.legs),
            needs_refresh: proposal.needs_refresh,
            avg_spread_pct,
            risk_reward,
            legs: proposal.legs.iter().map(|leg| leg.completeness()).collect(),
            trigger: trigger.to_string(),
        }
    }
}

/// Result of one snapshot fetch over a whole proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotResult {
    pub proposal: StrategyProposal,
    pub reasons: Vec<String>,
    pub accepted: bool,
    /// Labels of legs that could not be quoted.
    pub missing_quotes: Vec<String>,
    pub delta_log: DeltaLog,
    pub governance: Governance,
}
