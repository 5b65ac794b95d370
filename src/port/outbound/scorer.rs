//! Acceptance scoring port.

use crate::domain::{AcceptanceCriteria, StrategyProposal};

/// Market context for scoring.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub criteria: &'a AcceptanceCriteria,
    pub spot_price: Option<f64>,
    pub interest_rate: f64,
}

/// Scorer verdict: a defined score means the proposal is accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scoring {
    pub score: Option<f64>,
    pub reasons: Vec<String>,
}

impl Scoring {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.score.is_some()
    }
}

/// Recomputes a proposal's acceptance after its legs were repriced.
///
/// Implementations may update the proposal's metrics in place.
pub trait ProposalScorer: Send + Sync {
    fn score(&self, proposal: &mut StrategyProposal, ctx: &ScoringContext<'_>) -> Scoring;
}
