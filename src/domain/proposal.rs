//! Multi-leg strategy proposals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::leg::{MidSource, OptionLeg};

/// Headline metrics carried by a proposal.
///
/// Values come from the strategy generator and are recomputed by the scorer
/// after a refresh. Missing values stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalMetrics {
    pub credit: Option<f64>,
    pub margin: Option<f64>,
    pub max_profit: Option<f64>,
    pub max_loss: Option<f64>,
    pub score: Option<f64>,
    pub pos: Option<f64>,
    pub ev: Option<f64>,
    pub rom: Option<f64>,
    pub edge: Option<f64>,
}

impl ProposalMetrics {
    /// Metrics tracked in refresh delta logs, in display order.
    pub const HEADLINE: [&'static str; 8] = [
        "score",
        "ev",
        "rom",
        "edge",
        "credit",
        "max_profit",
        "max_loss",
        "pos",
    ];

    /// Look up a metric by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "credit" => self.credit,
            "margin" => self.margin,
            "max_profit" => self.max_profit,
            "max_loss" => self.max_loss,
            "score" => self.score,
            "pos" => self.pos,
            "ev" => self.ev,
            "rom" => self.rom,
            "edge" => self.edge,
            _ => None,
        }
    }

    /// Set a metric by name. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: Option<f64>) {
        let slot = match name {
            "credit" => &mut self.credit,
            "margin" => &mut self.margin,
            "max_profit" => &mut self.max_profit,
            "max_loss" => &mut self.max_loss,
            "score" => &mut self.score,
            "pos" => &mut self.pos,
            "ev" => &mut self.ev,
            "rom" => &mut self.rom,
            "edge" => &mut self.edge,
            _ => return,
        };
        *slot = value;
    }
}

/// A priced multi-leg strategy proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProposal {
    pub strategy: String,
    pub symbol: String,
    pub legs: Vec<OptionLeg>,
    pub metrics: ProposalMetrics,
    pub reasons: Vec<String>,
    pub needs_refresh: bool,
    pub fallback_summary: BTreeMap<MidSource, usize>,
}

impl StrategyProposal {
    /// Create a proposal and derive its fallback summary from the legs.
    pub fn new(
        strategy: impl Into<String>,
        symbol: impl Into<String>,
        legs: Vec<OptionLeg>,
        metrics: ProposalMetrics,
    ) -> Self {
        let mut proposal = Self {
            strategy: strategy.into(),
            symbol: symbol.into(),
            legs,
            metrics,
            reasons: Vec::new(),
            needs_refresh: false,
            fallback_summary: BTreeMap::new(),
        };
        proposal.refresh_provenance();
        proposal
    }

    /// First leg, used for ordering and display.
    #[must_use]
    pub fn first_leg(&self) -> Option<&OptionLeg> {
        self.legs.first()
    }

    /// Recount mid sources and recompute `needs_refresh`.
    ///
    /// A proposal needs a refresh while any leg is missing a quote or lacks
    /// a trusted mid.
    pub fn refresh_provenance(&mut self) {
        self.fallback_summary = mid_source_histogram(&self.legs);
        self.needs_refresh = self
            .legs
            .iter()
            .any(|leg| leg.missing_edge || !leg.mid_source.is_some_and(MidSource::is_trusted));
    }

    /// Legs flagged as missing a usable quote.
    pub fn missing_legs(&self) -> impl Iterator<Item = &OptionLeg> {
        self.legs.iter().filter(|leg| leg.missing_edge)
    }
}

/// Count legs per mid source.
#[must_use]
pub fn mid_source_histogram(legs: &[OptionLeg]) -> BTreeMap<MidSource, usize> {
    let mut counts = BTreeMap::new();
    for source in legs.iter().filter_map(|leg| leg.mid_source) {
        *counts.entry(source).or_insert(0) += 1;
    }
    counts
}
