//! Venue-agnostic domain logic: legs, proposals, mid resolution, spread policy.

pub mod contract;
pub mod criteria;
pub mod error;
pub mod leg;
pub mod mid;
pub mod proposal;
pub mod refresh;
pub mod snapshot;
pub mod spread;

// Core domain types
pub use contract::OptionContract;
pub use criteria::AcceptanceCriteria;
pub use leg::{finite, LegCompleteness, MidSource, OptionLeg, QuoteSnapshot, Right};
pub use proposal::{ProposalMetrics, StrategyProposal};
pub use refresh::{
    AcceptedProposal, PipelineError, PipelineStats, RefreshResult, RefreshSource, Rejection,
};
pub use snapshot::{DeltaLog, Governance, LegDelta, MetricDelta, SnapshotResult};
pub use spread::{SpreadContext, SpreadDecision, SpreadOverrides, SpreadPolicy, SpreadReason};
