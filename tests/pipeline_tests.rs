//! Refresh pipeline behavior through the public API.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use quote_refresh::application::pipeline::{
    RefreshDefaults, RefreshParams, RefreshPipeline, SortKey,
};
use quote_refresh::domain::{PipelineError, RefreshResult, RefreshSource, StrategyProposal};
use quote_refresh::error::ConfigError;
use quote_refresh::port::{FetchError, SnapshotFetcher};
use quote_refresh::testkit::entry::{condor_entry, entry, legless_entry, shuffled_entries};
use quote_refresh::testkit::fetcher::{
    AcceptingFetcher, FlakyFetcher, InstrumentedFetcher, RejectingFetcher, TimeoutFetcher,
};

fn pipeline(fetcher: Arc<dyn SnapshotFetcher>) -> RefreshPipeline {
    RefreshPipeline::new(RefreshDefaults::default(), fetcher)
}

fn order(result: &RefreshResult) -> (Vec<usize>, Vec<usize>) {
    (
        result.accepted.iter().map(|a| a.source.index).collect(),
        result.rejections.iter().map(|r| r.source.index).collect(),
    )
}

#[tokio::test]
async fn empty_input_yields_zero_stats() {
    let fetcher = Arc::new(AcceptingFetcher::new());
    let result = pipeline(fetcher.clone())
        .refresh(Vec::new(), RefreshParams::default())
        .await
        .unwrap();

    assert_eq!(result, RefreshResult::default());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn accepting_fetcher_accepts_condor_entry() {
    let result = pipeline(Arc::new(AcceptingFetcher::new()))
        .refresh(vec![condor_entry()], RefreshParams::default())
        .await
        .unwrap();

    assert_eq!(result.accepted.len(), 1);
    assert!(result.rejections.is_empty());
    assert_eq!(
        (
            result.stats.total,
            result.stats.accepted,
            result.stats.rejected,
            result.stats.failed
        ),
        (1, 1, 0, 0)
    );

    let accepted = &result.accepted[0];
    assert_eq!(accepted.source.symbol, "AAA");
    assert_eq!(accepted.proposal.strategy, "iron_condor");
    assert_eq!(accepted.proposal.metrics.score, Some(10.0));
    assert_eq!(accepted.attempts, 1);
    assert_eq!(accepted.governance.trigger, "pipeline_refresh");
}

#[tokio::test]
async fn one_failure_then_success_counts_a_retry() {
    let fetcher = Arc::new(FlakyFetcher::new(1, FetchError::Upstream("connection refused".into())));
    let params = RefreshParams {
        max_attempts: Some(2),
        retry_delay_secs: Some(0.0),
        ..RefreshParams::default()
    };

    let result = pipeline(fetcher.clone())
        .refresh(vec![condor_entry()], params)
        .await
        .unwrap();

    assert_eq!(result.accepted.len(), 1);
    assert_eq!(result.accepted[0].attempts, 2);
    assert_eq!(result.stats.attempts, 2);
    assert_eq!(result.stats.retries, 1);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn entry_without_legs_is_incomplete_without_attempts() {
    let fetcher = Arc::new(AcceptingFetcher::new());
    let result = pipeline(fetcher.clone())
        .refresh(vec![legless_entry()], RefreshParams::default())
        .await
        .unwrap();

    assert!(result.accepted.is_empty());
    let rejection = &result.rejections[0];
    assert!(matches!(
        rejection.error,
        Some(PipelineError::IncompleteData(_))
    ));
    assert_eq!(rejection.attempts, 0);
    assert!(rejection.proposal.is_none());
    assert_eq!(result.stats.failed, 1);
    assert_eq!(result.stats.retries, 0);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn timeouts_exhaust_exactly_max_attempts() {
    for max_attempts in 1..=4 {
        let fetcher = Arc::new(TimeoutFetcher::new());
        let params = RefreshParams {
            max_attempts: Some(max_attempts),
            ..RefreshParams::default()
        };

        let result = pipeline(fetcher.clone())
            .refresh(vec![condor_entry(), entry("BBB", "2026-01-16", 50.0)], params)
            .await
            .unwrap();

        assert_eq!(fetcher.calls(), 2 * max_attempts);
        assert_eq!(result.rejections.len(), 2);
        for rejection in &result.rejections {
            assert_eq!(rejection.attempts, max_attempts);
            assert!(matches!(
                rejection.error,
                Some(PipelineError::PipelineTimeout(_))
            ));
            // The rebuilt proposal survives so callers can explain the failure.
            assert!(rejection.proposal.is_some());
        }
        assert_eq!(result.stats.retries, 2 * (max_attempts - 1));
    }
}

#[tokio::test]
async fn incomplete_data_from_fetcher_is_not_retried() {
    let fetcher = Arc::new(FlakyFetcher::new(5, FetchError::IncompleteData("bad strike".into())));
    let params = RefreshParams {
        max_attempts: Some(3),
        ..RefreshParams::default()
    };

    let result = pipeline(fetcher.clone())
        .refresh(vec![condor_entry()], params)
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(result.rejections[0].attempts, 1);
    assert!(matches!(
        result.rejections[0].error,
        Some(PipelineError::IncompleteData(_))
    ));
}

#[tokio::test]
async fn scored_rejection_keeps_reasons_without_error() {
    let fetcher = Arc::new(RejectingFetcher::new(&["score 1.0000 below minimum 5.0000"]));
    let result = pipeline(fetcher)
        .refresh(vec![condor_entry()], RefreshParams::default())
        .await
        .unwrap();

    let rejection = &result.rejections[0];
    assert!(rejection.error.is_none());
    assert_eq!(rejection.reasons, vec!["score 1.0000 below minimum 5.0000"]);
    assert!(rejection.governance.is_some());
    assert_eq!(result.stats.rejected, 1);
    assert_eq!(result.stats.failed, 0);
}

#[tokio::test]
async fn totals_always_balance() {
    let entries = vec![
        condor_entry(),
        legless_entry(),
        json!({"strategy": "x", "legs": []}),
        json!("not an object"),
        entry("CCC", "20260320", 12.5),
        json!({"strategy": "x", "legs": [{"expiry": "2025-12-19", "type": "put"}], "meta": {"symbol": "DDD"}}),
    ];

    for parallel in [false, true] {
        let params = RefreshParams {
            parallel: Some(parallel),
            ..RefreshParams::default()
        };
        let result = pipeline(Arc::new(AcceptingFetcher::new()))
            .refresh(entries.clone(), params)
            .await
            .unwrap();

        assert_eq!(result.stats.total, entries.len());
        assert_eq!(result.stats.accepted + result.stats.rejected, result.stats.total);
        assert_eq!(result.stats.accepted, 2);
        assert_eq!(result.stats.failed, 4);
    }
}

#[tokio::test]
async fn repeated_runs_produce_identical_order() {
    let entries = shuffled_entries(24);

    for parallel in [false, true] {
        let params = RefreshParams {
            parallel: Some(parallel),
            max_workers: Some(5),
            ..RefreshParams::default()
        };
        let fetcher = InstrumentedFetcher::new(Duration::from_millis(1));
        let pipeline = pipeline(fetcher);

        let first = pipeline.refresh(entries.clone(), params.clone()).await.unwrap();
        let second = pipeline.refresh(entries.clone(), params).await.unwrap();

        assert_eq!(order(&first), order(&second));
        assert_eq!(first.accepted, second.accepted);

        let symbols: Vec<&str> = first
            .accepted
            .iter()
            .map(|a| a.proposal.symbol.as_str())
            .collect();
        let mut sorted = symbols.clone();
        sorted.sort_unstable();
        assert_eq!(symbols, sorted, "accepted list should be sorted by symbol");
    }
}

#[tokio::test]
async fn custom_sort_key_overrides_default() {
    let entries = vec![
        entry("AAA", "2025-12-19", 100.0),
        entry("BBB", "2025-12-19", 300.0),
        entry("CCC", "2025-12-19", 200.0),
    ];
    let params = RefreshParams {
        sort_key: Some(Arc::new(|_source: &RefreshSource, proposal: Option<&StrategyProposal>| {
            let strike = proposal
                .and_then(|p| p.first_leg())
                .map_or(0.0, |leg| leg.strike);
            SortKey::default().number(-strike)
        })),
        ..RefreshParams::default()
    };

    let result = pipeline(Arc::new(AcceptingFetcher::new()))
        .refresh(entries, params)
        .await
        .unwrap();

    let symbols: Vec<&str> = result
        .accepted
        .iter()
        .map(|a| a.proposal.symbol.as_str())
        .collect();
    assert_eq!(symbols, ["BBB", "CCC", "AAA"]);
}

#[tokio::test(start_paused = true)]
async fn inflight_bound_holds_for_every_limit() {
    for limit in 1..=4 {
        let fetcher = InstrumentedFetcher::new(Duration::from_millis(50));
        let params = RefreshParams {
            parallel: Some(true),
            max_workers: Some(8),
            max_inflight: Some(limit),
            ..RefreshParams::default()
        };

        let result = pipeline(fetcher.clone())
            .refresh(shuffled_entries(12), params)
            .await
            .unwrap();

        assert_eq!(result.stats.accepted, 12);
        assert!(fetcher.peak() <= limit, "peak {} over limit {limit}", fetcher.peak());
        assert!(fetcher.peak() >= 1);
    }
}

#[tokio::test(start_paused = true)]
async fn worker_pool_bounds_concurrency_without_throttle() {
    let fetcher = InstrumentedFetcher::new(Duration::from_millis(20));
    let params = RefreshParams {
        parallel: Some(true),
        max_workers: Some(3),
        ..RefreshParams::default()
    };

    pipeline(fetcher.clone())
        .refresh(shuffled_entries(10), params)
        .await
        .unwrap();

    assert_eq!(fetcher.peak(), 3);
}

#[tokio::test(start_paused = true)]
async fn call_starts_respect_min_interval() {
    let interval = Duration::from_millis(250);
    let fetcher = InstrumentedFetcher::new(Duration::from_millis(10));
    let params = RefreshParams {
        parallel: Some(true),
        max_workers: Some(6),
        min_interval_secs: Some(interval.as_secs_f64()),
        ..RefreshParams::default()
    };

    pipeline(fetcher.clone())
        .refresh(shuffled_entries(8), params)
        .await
        .unwrap();

    assert_eq!(fetcher.starts().len(), 8);
    let gap = fetcher.min_start_gap().unwrap();
    assert!(gap >= interval, "starts {gap:?} apart, expected at least {interval:?}");
}

#[tokio::test(start_paused = true)]
async fn retry_delay_separates_attempts() {
    let fetcher = Arc::new(TimeoutFetcher::new());
    let params = RefreshParams {
        max_attempts: Some(3),
        retry_delay_secs: Some(2.0),
        ..RefreshParams::default()
    };

    let started = tokio::time::Instant::now();
    pipeline(fetcher)
        .refresh(vec![condor_entry()], params)
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(4));
}

#[tokio::test]
async fn malformed_params_fail_the_run() {
    let cases = [
        RefreshParams {
            max_attempts: Some(0),
            ..RefreshParams::default()
        },
        RefreshParams {
            timeout_secs: Some(-1.0),
            ..RefreshParams::default()
        },
        RefreshParams {
            retry_delay_secs: Some(f64::NAN),
            ..RefreshParams::default()
        },
        RefreshParams {
            max_inflight: Some(0),
            ..RefreshParams::default()
        },
        RefreshParams {
            max_inflight: Some(usize::MAX),
            ..RefreshParams::default()
        },
        RefreshParams {
            parallel: Some(true),
            max_workers: Some(usize::MAX),
            ..RefreshParams::default()
        },
        RefreshParams {
            min_interval_secs: Some(1e19),
            ..RefreshParams::default()
        },
    ];

    for params in cases {
        let err = pipeline(Arc::new(AcceptingFetcher::new()))
            .refresh(vec![condor_entry(), condor_entry()], params)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}

#[tokio::test]
async fn per_call_fetcher_overrides_default() {
    let default = Arc::new(AcceptingFetcher::new());
    let override_fetcher = Arc::new(TimeoutFetcher::new());
    let params = RefreshParams {
        fetcher: Some(override_fetcher.clone()),
        trigger: Some("manual".into()),
        ..RefreshParams::default()
    };

    let result = pipeline(default.clone())
        .refresh(vec![condor_entry()], params)
        .await
        .unwrap();

    assert_eq!(default.calls(), 0);
    assert_eq!(override_fetcher.calls(), 1);
    assert_eq!(result.stats.failed, 1);
}
