//! Proposal builder port.

use crate::domain::error::DomainError;
use crate::domain::StrategyProposal;

/// Turns an opaque rejection entry into a typed proposal.
///
/// This is the validation boundary: anything the pipeline sees past this
/// point is a [`StrategyProposal`].
pub trait ProposalBuilder: Send + Sync {
    /// Build a proposal from `entry`.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when the entry cannot become a proposal.
    fn build(&self, entry: &serde_json::Value) -> Result<StrategyProposal, DomainError>;
}
