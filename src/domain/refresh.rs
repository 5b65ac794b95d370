//! Refresh outcomes, error taxonomy and run statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::proposal::StrategyProposal;
use super::snapshot::Governance;

/// Why an entry failed to refresh.
///
/// Timeouts and upstream failures are transient and retried; incomplete data
/// is terminal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PipelineError {
    #[error("incomplete data: {0}")]
    IncompleteData(String),

    #[error("market data timed out: {0}")]
    PipelineTimeout(String),

    #[error("upstream error: {0}")]
    UpstreamError(String),
}

impl PipelineError {
    /// Transient errors are worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::IncompleteData(_))
    }

    /// Short tag for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::IncompleteData(_) => "incomplete_data",
            Self::PipelineTimeout(_) => "pipeline_timeout",
            Self::UpstreamError(_) => "upstream_error",
        }
    }
}

/// Correlates an outcome with its input entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshSource {
    /// Position of the entry in the caller's input.
    pub index: usize,
    pub entry: serde_json::Value,
    pub symbol: String,
}

/// A proposal that qualifies after refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedProposal {
    pub source: RefreshSource,
    pub proposal: StrategyProposal,
    pub reasons: Vec<String>,
    pub governance: Governance,
    pub attempts: u32,
}

/// An entry that did not qualify, with enough context to explain why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub source: RefreshSource,
    /// Absent when the entry could not be turned into a proposal.
    pub proposal: Option<StrategyProposal>,
    pub reasons: Vec<String>,
    pub error: Option<PipelineError>,
    pub attempts: u32,
    pub governance: Option<Governance>,
}

impl Rejection {
    /// Rejection caused by an error rather than by scoring.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate statistics for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Rejections that carry an error.
    pub failed: usize,
    pub duration: Duration,
    /// Fetch attempts across all entries.
    pub attempts: u32,
    /// Attempts beyond the first for each entry that made one.
    pub retries: u32,
}

impl PipelineStats {
    /// Compute statistics from classified outcomes.
    #[must_use]
    pub fn compute(
        total: usize,
        accepted: &[AcceptedProposal],
        rejections: &[Rejection],
        duration: Duration,
    ) -> Self {
        let attempt_counts = accepted
            .iter()
            .map(|a| a.attempts)
            .chain(rejections.iter().map(|r| r.attempts));

        let (attempts, attempted_entries) = attempt_counts
            .fold((0u32, 0u32), |(sum, entries), n| {
                (sum + n, entries + u32::from(n > 0))
            });

        Self {
            total,
            accepted: accepted.len(),
            rejected: rejections.len(),
            failed: rejections.iter().filter(|r| r.is_failure()).count(),
            duration,
            attempts,
            retries: attempts - attempted_entries,
        }
    }
}

/// Everything a refresh run reports back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshResult {
    pub accepted: Vec<AcceptedProposal>,
    pub rejections: Vec<Rejection>,
    pub stats: PipelineStats,
}
