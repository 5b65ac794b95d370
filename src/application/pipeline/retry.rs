//! Attempt loop for one entry.
//!
//! Each attempt reports an explicit [`AttemptOutcome`]; [`run_with_retry`]
//! is a plain loop over those outcomes, so the retry state machine can be
//! tested without a fetcher.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::domain::PipelineError;
use crate::port::FetchError;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below one is raised to one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T> {
    Success(T),
    /// Worth another attempt if the budget allows.
    Retryable(PipelineError),
    /// Stop immediately.
    Terminal(PipelineError),
}

impl<T> AttemptOutcome<T> {
    /// Classify a fetch result.
    pub fn from_fetch(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => {
                let err = PipelineError::from(err);
                if err.is_retryable() {
                    Self::Retryable(err)
                } else {
                    Self::Terminal(err)
                }
            }
        }
    }
}

/// Final result of the loop and how many attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryReport<T> {
    pub result: Result<T, PipelineError>,
    pub attempts: u32,
}

/// Run `attempt` until it succeeds, fails terminally or the budget runs out.
///
/// `attempt` receives the 1-based attempt number. The policy delay is slept
/// between attempts only, never after the last one.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> RetryReport<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome<T>>,
{
    let mut number = 1;
    loop {
        match attempt(number).await {
            AttemptOutcome::Success(value) => {
                return RetryReport {
                    result: Ok(value),
                    attempts: number,
                }
            }
            AttemptOutcome::Terminal(err) => {
                return RetryReport {
                    result: Err(err),
                    attempts: number,
                }
            }
            AttemptOutcome::Retryable(err) if number >= policy.max_attempts => {
                return RetryReport {
                    result: Err(err),
                    attempts: number,
                }
            }
            AttemptOutcome::Retryable(_) => {
                if !policy.delay.is_zero() {
                    sleep(policy.delay).await;
                }
                number += 1;
            }
        }
    }
}
