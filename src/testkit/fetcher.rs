//! Stub [`SnapshotFetcher`] implementations for pipeline tests.
//!
//! - [`AcceptingFetcher`] - Accepts every proposal unchanged.
//! - [`FlakyFetcher`] - Fails a fixed number of calls, then accepts.
//! - [`TimeoutFetcher`] - Always times out.
//! - [`InstrumentedFetcher`] - Holds each call open and records
//!   concurrency and start times.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::domain::{DeltaLog, Governance, SnapshotResult, StrategyProposal};
use crate::port::{FetchError, SnapshotFetcher, SnapshotRequest};

/// Accepted result carrying `proposal` unchanged.
pub fn accepted_snapshot(proposal: StrategyProposal, request: &SnapshotRequest) -> SnapshotResult {
    let governance = Governance::derive(&proposal, &request.trigger);
    SnapshotResult {
        proposal,
        reasons: Vec::new(),
        accepted: true,
        missing_quotes: Vec::new(),
        delta_log: DeltaLog::default(),
        governance,
    }
}

// ---------------------------------------------------------------------------
// AcceptingFetcher
// ---------------------------------------------------------------------------

/// Accepts every proposal and counts calls.
#[derive(Debug, Default)]
pub struct AcceptingFetcher {
    calls: AtomicU32,
}

impl AcceptingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for AcceptingFetcher {
    async fn fetch(
        &self,
        proposal: StrategyProposal,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(accepted_snapshot(proposal, request))
    }
}

// ---------------------------------------------------------------------------
// RejectingFetcher
// ---------------------------------------------------------------------------

/// Returns a non-accepted snapshot with fixed reasons.
#[derive(Debug, Clone)]
pub struct RejectingFetcher {
    reasons: Vec<String>,
}

impl RejectingFetcher {
    pub fn new(reasons: &[&str]) -> Self {
        Self {
            reasons: reasons.iter().map(|r| (*r).to_string()).collect(),
        }
    }
}

#[async_trait]
impl SnapshotFetcher for RejectingFetcher {
    async fn fetch(
        &self,
        proposal: StrategyProposal,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResult, FetchError> {
        let mut result = accepted_snapshot(proposal, request);
        result.accepted = false;
        result.reasons.clone_from(&self.reasons);
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// FlakyFetcher
// ---------------------------------------------------------------------------

/// Fails the first `failures` calls with `error`, then accepts.
#[derive(Debug)]
pub struct FlakyFetcher {
    failures: u32,
    error: FetchError,
    calls: AtomicU32,
}

impl FlakyFetcher {
    pub fn new(failures: u32, error: FetchError) -> Self {
        Self {
            failures,
            error,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for FlakyFetcher {
    async fn fetch(
        &self,
        proposal: StrategyProposal,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResult, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(self.error.clone());
        }
        Ok(accepted_snapshot(proposal, request))
    }
}

// ---------------------------------------------------------------------------
// TimeoutFetcher
// ---------------------------------------------------------------------------

/// Every call times out after the request's deadline.
#[derive(Debug, Default)]
pub struct TimeoutFetcher {
    calls: AtomicU32,
}

impl TimeoutFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for TimeoutFetcher {
    async fn fetch(
        &self,
        _proposal: StrategyProposal,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::Timeout(request.timeout))
    }
}

// ---------------------------------------------------------------------------
// InstrumentedFetcher
// ---------------------------------------------------------------------------

/// Holds every call open for `hold` and records what it observed.
#[derive(Debug)]
pub struct InstrumentedFetcher {
    hold: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    starts: Mutex<Vec<Instant>>,
}

impl InstrumentedFetcher {
    pub fn new(hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            hold,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            starts: Mutex::new(Vec::new()),
        })
    }

    /// Highest number of calls observed in flight at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Call start times, in start order.
    pub fn starts(&self) -> Vec<Instant> {
        let mut starts = self.starts.lock().clone();
        starts.sort();
        starts
    }

    /// Smallest gap between consecutive call starts.
    pub fn min_start_gap(&self) -> Option<Duration> {
        self.starts()
            .windows(2)
            .map(|pair| pair[1].duration_since(pair[0]))
            .min()
    }
}

#[async_trait]
impl SnapshotFetcher for InstrumentedFetcher {
    async fn fetch(
        &self,
        proposal: StrategyProposal,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResult, FetchError> {
        self.starts.lock().push(Instant::now());
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        tokio::time::sleep(self.hold).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(accepted_snapshot(proposal, request))
    }
}
