//! Snapshot fetcher port.
//!
//! The pipeline drives any [`SnapshotFetcher`]; the default is the
//! gateway-backed quote fetcher, tests substitute stubs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AcceptanceCriteria, PipelineError, SnapshotResult, StrategyProposal};

/// Inputs shared by every attempt of one pipeline run.
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub criteria: Arc<AcceptanceCriteria>,
    pub spot_price: Option<f64>,
    pub interest_rate: f64,
    /// Deadline applied to each gateway wait.
    pub timeout: Duration,
    /// What initiated the refresh, carried into governance metadata.
    pub trigger: String,
}

/// Failure of a whole fetch, as opposed to a single missing leg.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("incomplete data: {0}")]
    IncompleteData(String),

    #[error("{0}")]
    Upstream(String),
}

impl From<FetchError> for PipelineError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout(after) => Self::PipelineTimeout(format!("no answer within {after:?}")),
            FetchError::IncompleteData(detail) => Self::IncompleteData(detail),
            FetchError::Upstream(detail) => Self::UpstreamError(detail),
        }
    }
}

/// Refresh every leg of a proposal and rescore it.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Fetch live quotes for `proposal`.
    ///
    /// # Errors
    ///
    /// Per-leg problems are reported inside the [`SnapshotResult`]; an error
    /// means the attempt as a whole failed.
    async fn fetch(
        &self,
        proposal: StrategyProposal,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResult, FetchError>;
}
