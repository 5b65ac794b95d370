//! Run orchestration: build, fetch with retries, classify, sort.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::retry::{run_with_retry, AttemptOutcome, RetryPolicy, RetryReport};
use super::settings::{RefreshDefaults, RefreshParams, RunSettings};
use super::sort::default_sort_key;
use crate::application::builder::{entry_symbol, preview_sources, EntryProposalBuilder};
use crate::application::throttle::RefreshThrottle;
use crate::domain::mid::ParityContext;
use crate::domain::{
    AcceptedProposal, PipelineError, PipelineStats, RefreshResult, RefreshSource, Rejection,
    SnapshotResult, StrategyProposal,
};
use crate::error::ConfigError;
use crate::port::{ProposalBuilder, SnapshotFetcher, SnapshotRequest};

/// Classified outcome of one entry.
#[derive(Debug)]
enum EntryOutcome {
    Accepted(AcceptedProposal),
    Rejected(Rejection),
}

/// Orchestrates refresh runs.
///
/// Holds process defaults and the default collaborators; each call to
/// [`refresh`](Self::refresh) creates its own throttle, so independent runs
/// never share state.
pub struct RefreshPipeline {
    defaults: RefreshDefaults,
    fetcher: Arc<dyn SnapshotFetcher>,
    builder: Option<Arc<dyn ProposalBuilder>>,
}

impl RefreshPipeline {
    pub fn new(defaults: RefreshDefaults, fetcher: Arc<dyn SnapshotFetcher>) -> Self {
        Self {
            defaults,
            fetcher,
            builder: None,
        }
    }

    /// Replace the default entry builder for every run.
    #[must_use]
    pub fn with_builder(mut self, builder: Arc<dyn ProposalBuilder>) -> Self {
        self.builder = Some(builder);
        self
    }

    pub fn defaults(&self) -> &RefreshDefaults {
        &self.defaults
    }

    /// Refresh `entries` and classify each one.
    ///
    /// # Errors
    ///
    /// Only malformed `params` fail the run. Every data or gateway failure
    /// becomes a [`Rejection`].
    pub async fn refresh(
        &self,
        entries: Vec<Value>,
        params: RefreshParams,
    ) -> Result<RefreshResult, ConfigError> {
        if entries.is_empty() {
            return Ok(RefreshResult::default());
        }

        let settings = RunSettings::resolve(&params, &self.defaults)?;
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let total = entries.len();
        let workers = settings.workers_for(total);

        info!(
            run_id = %run_id,
            entries = total,
            workers = workers.unwrap_or(1),
            max_attempts = settings.max_attempts,
            timeout_ms = settings.timeout.as_millis() as u64,
            max_inflight = ?settings.throttle.max_inflight,
            min_interval_ms = settings.throttle.min_interval.as_millis() as u64,
            trigger = %settings.trigger,
            "Refresh pipeline started"
        );

        let builder = params
            .builder
            .clone()
            .or_else(|| self.builder.clone())
            .unwrap_or_else(|| {
                Arc::new(EntryProposalBuilder::new(ParityContext {
                    spot: settings.spot_price,
                    rate: settings.interest_rate,
                    today: Utc::now().date_naive(),
                }))
            });
        let fetcher = params
            .fetcher
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.fetcher));
        let sort_key = params
            .sort_key
            .clone()
            .unwrap_or_else(|| Arc::new(default_sort_key));

        let sources: Vec<RefreshSource> = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| RefreshSource {
                index,
                symbol: entry_symbol(&entry),
                entry,
            })
            .collect();

        let run = Arc::new(RunContext {
            run_id,
            builder,
            fetcher,
            throttle: RefreshThrottle::new(settings.throttle),
            retry: RetryPolicy::new(settings.max_attempts, settings.retry_delay),
            request: SnapshotRequest {
                criteria: Arc::new(settings.criteria.clone()),
                spot_price: settings.spot_price,
                interest_rate: settings.interest_rate,
                timeout: settings.timeout,
                trigger: settings.trigger.clone(),
            },
        });

        let outcomes = match workers {
            None => {
                let mut outcomes = Vec::with_capacity(total);
                for source in sources {
                    outcomes.push(run.process(source).await);
                }
                outcomes
            }
            Some(workers) => run_parallel(&run, sources, workers).await,
        };

        let mut accepted = Vec::new();
        let mut rejections = Vec::new();
        for outcome in outcomes {
            match outcome {
                EntryOutcome::Accepted(proposal) => accepted.push(proposal),
                EntryOutcome::Rejected(rejection) => rejections.push(rejection),
            }
        }

        accepted.sort_by_cached_key(|a: &AcceptedProposal| {
            (sort_key(&a.source, Some(&a.proposal)), a.source.index)
        });
        rejections.sort_by_cached_key(|r: &Rejection| {
            (sort_key(&r.source, r.proposal.as_ref()), r.source.index)
        });

        let stats = PipelineStats::compute(total, &accepted, &rejections, started.elapsed());
        info!(
            run_id = %run_id,
            total = stats.total,
            accepted = stats.accepted,
            rejected = stats.rejected,
            failed = stats.failed,
            attempts = stats.attempts,
            retries = stats.retries,
            duration_ms = stats.duration.as_millis() as u64,
            "Refresh pipeline finished"
        );

        Ok(RefreshResult {
            accepted,
            rejections,
            stats,
        })
    }
}

/// Process every source on spawned tasks, at most `workers` at a time.
///
/// A task that dies becomes an upstream-error rejection, so every source
/// still yields exactly one outcome.
async fn run_parallel(
    run: &Arc<RunContext>,
    sources: Vec<RefreshSource>,
    workers: usize,
) -> Vec<EntryOutcome> {
    let pool = Arc::new(Semaphore::new(workers));
    let handles: Vec<_> = sources
        .iter()
        .cloned()
        .map(|source| {
            let run = Arc::clone(run);
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let _worker = pool.acquire_owned().await.ok();
                run.process(source).await
            })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .zip(sources)
        .map(|(joined, source)| {
            joined.unwrap_or_else(|err| {
                warn!(run_id = %run.run_id, index = source.index, error = %err, "Refresh task aborted");
                EntryOutcome::Rejected(Rejection {
                    source,
                    proposal: None,
                    reasons: Vec::new(),
                    error: Some(PipelineError::UpstreamError(format!("refresh task failed: {err}"))),
                    attempts: 0,
                    governance: None,
                })
            })
        })
        .collect()
}

/// Everything a single entry needs, shared by all tasks of one run.
struct RunContext {
    run_id: Uuid,
    builder: Arc<dyn ProposalBuilder>,
    fetcher: Arc<dyn SnapshotFetcher>,
    throttle: RefreshThrottle,
    retry: RetryPolicy,
    request: SnapshotRequest,
}

impl RunContext {
    async fn process(&self, source: RefreshSource) -> EntryOutcome {
        let proposal = match self.builder.build(&source.entry) {
            Ok(proposal) => proposal,
            Err(err) => {
                warn!(run_id = %self.run_id, index = source.index, error = %err, "Entry could not be rebuilt");
                return EntryOutcome::Rejected(Rejection {
                    source,
                    proposal: None,
                    reasons: vec![err.to_string()],
                    error: Some(PipelineError::IncompleteData(err.to_string())),
                    attempts: 0,
                    governance: None,
                });
            }
        };
        debug!(
            run_id = %self.run_id,
            index = source.index,
            strategy = %proposal.strategy,
            legs = proposal.legs.len(),
            preview_legs = preview_sources(&proposal),
            "Entry rebuilt"
        );

        let report = run_with_retry(&self.retry, |attempt| {
            let proposal = proposal.clone();
            let index = source.index;
            async move {
                let _permit = self.throttle.acquire().await;
                let outcome = AttemptOutcome::from_fetch(self.fetcher.fetch(proposal, &self.request).await);
                if let AttemptOutcome::Retryable(err) | AttemptOutcome::Terminal(err) = &outcome {
                    warn!(
                        run_id = %self.run_id,
                        index,
                        attempt,
                        max_attempts = self.retry.max_attempts(),
                        kind = err.kind(),
                        error = %err,
                        "Refresh attempt failed"
                    );
                }
                outcome
            }
        })
        .await;

        classify(source, proposal, report)
    }
}

fn classify(
    source: RefreshSource,
    proposal: StrategyProposal,
    report: RetryReport<SnapshotResult>,
) -> EntryOutcome {
    let attempts = report.attempts;
    match report.result {
        Ok(snapshot) if snapshot.accepted => EntryOutcome::Accepted(AcceptedProposal {
            source,
            proposal: snapshot.proposal,
            reasons: snapshot.reasons,
            governance: snapshot.governance,
            attempts,
        }),
        Ok(snapshot) => EntryOutcome::Rejected(Rejection {
            source,
            proposal: Some(snapshot.proposal),
            reasons: snapshot.reasons,
            error: None,
            attempts,
            governance: Some(snapshot.governance),
        }),
        Err(err) => EntryOutcome::Rejected(Rejection {
            source,
            reasons: proposal.reasons.clone(),
            proposal: Some(proposal),
            error: Some(err),
            attempts,
            governance: None,
        }),
    }
}
