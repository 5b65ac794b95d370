//! Criteria-based acceptance scoring.
//!
//! Rescores a refreshed proposal against [`AcceptanceCriteria`]: quote
//! coverage, per-leg spread policy and metric minimums. The strategy math
//! itself (EV, ROM, POS) stays with the generator; this scorer only
//! recomputes the net credit from refreshed mids.

use tracing::debug;

use crate::domain::{
    finite, AcceptanceCriteria, OptionLeg, SpreadContext, SpreadOverrides, StrategyProposal,
};
use crate::port::{ProposalScorer, Scoring, ScoringContext};

/// Default [`ProposalScorer`].
///
/// Checks run in order: missing quotes, spreads, then metric minimums. All
/// failures are collected so a rejection explains itself completely.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaScorer;

impl CriteriaScorer {
    pub const fn new() -> Self {
        Self
    }

    fn check_coverage(proposal: &StrategyProposal, criteria: &AcceptanceCriteria, reasons: &mut Vec<String>) {
        let missing = proposal.missing_legs().count();
        if missing > criteria.max_missing_legs {
            reasons.push(format!(
                "missing quotes on {missing} leg(s), {} allowed",
                criteria.max_missing_legs
            ));
        }
    }

    fn check_spreads(proposal: &StrategyProposal, ctx: &ScoringContext<'_>, reasons: &mut Vec<String>) {
        let width = strike_width(&proposal.legs);
        for leg in proposal.legs.iter().filter(|leg| !leg.missing_edge) {
            let Some(spread) = leg.spread() else {
                continue;
            };
            let spread_ctx = SpreadContext {
                symbol: Some(proposal.symbol.clone()),
                structure: Some(proposal.strategy.clone()),
                right: Some(leg.right),
                leg_count: Some(proposal.legs.len()),
                width,
            };
            let decision = ctx.criteria.spread.evaluate(
                spread,
                leg.mid,
                ctx.spot_price,
                &spread_ctx,
                &SpreadOverrides::default(),
            );
            debug!(
                leg = %leg.label(),
                spread,
                rule = %decision.rule,
                reason = %decision.reason,
                accepted = decision.accepted,
                "Spread evaluated"
            );
            if !decision.accepted {
                let limit = decision
                    .threshold
                    .map_or_else(|| "n/a".to_string(), |t| format!("{t:.2}"));
                reasons.push(format!(
                    "{}: spread {spread:.2} rejected ({}, limit {limit}, rule {})",
                    leg.label(),
                    decision.reason,
                    decision.rule
                ));
            }
        }
    }

    fn check_minimums(proposal: &StrategyProposal, criteria: &AcceptanceCriteria, reasons: &mut Vec<String>) {
        let metrics = &proposal.metrics;
        let checks = [
            ("score", metrics.score, criteria.min_score),
            ("pos", metrics.pos, criteria.min_pos),
            ("rom", metrics.rom, criteria.min_rom),
            ("edge", metrics.edge, criteria.min_edge),
            ("credit", metrics.credit, criteria.min_credit),
        ];
        for (name, value, minimum) in checks {
            let Some(minimum) = minimum else {
                continue;
            };
            match finite(value) {
                Some(value) if value >= minimum => {}
                Some(value) => reasons.push(format!("{name} {value:.4} below minimum {minimum:.4}")),
                None => reasons.push(format!("{name} unavailable")),
            }
        }
    }
}

impl ProposalScorer for CriteriaScorer {
    fn score(&self, proposal: &mut StrategyProposal, ctx: &ScoringContext<'_>) -> Scoring {
        if proposal.missing_legs().next().is_none() {
            if let Some(credit) = net_credit(&proposal.legs) {
                proposal.metrics.credit = Some(credit);
            }
        }

        let mut reasons = Vec::new();
        Self::check_coverage(proposal, ctx.criteria, &mut reasons);
        Self::check_spreads(proposal, ctx, &mut reasons);
        Self::check_minimums(proposal, ctx.criteria, &mut reasons);

        let score = reasons
            .is_empty()
            .then(|| finite(proposal.metrics.score).unwrap_or(0.0));
        Scoring { score, reasons }
    }
}

/// Net premium received per share: short legs add, long legs subtract.
///
/// `None` when any leg lacks a finite mid.
#[must_use]
pub fn net_credit(legs: &[OptionLeg]) -> Option<f64> {
    legs.iter()
        .map(|leg| finite(leg.mid).map(|mid| -(leg.position as f64) * mid))
        .sum()
}

/// Distance between the lowest and highest strike of a multi-leg structure.
#[must_use]
pub fn strike_width(legs: &[OptionLeg]) -> Option<f64> {
    if legs.len() < 2 {
        return None;
    }
    let (low, high) = legs.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), leg| {
        (lo.min(leg.strike), hi.max(leg.strike))
    });
    finite(Some(high - low))
}
