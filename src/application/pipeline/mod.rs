//! Refresh pipeline: rebuild, refetch and reclassify a batch of entries.
//!
//! For every entry the pipeline builds a proposal, drives the snapshot
//! fetcher through the shared
//! [`RefreshThrottle`](crate::application::throttle::RefreshThrottle) with bounded retries, and
//! classifies the outcome. Entries run sequentially or on a bounded pool of
//! tasks; the final lists are sorted so repeated runs over the same input
//! agree regardless of scheduling.

mod retry;
mod runner;
mod settings;
mod sort;

pub use retry::{run_with_retry, AttemptOutcome, RetryPolicy, RetryReport};
pub use runner::RefreshPipeline;
pub use settings::{
    RefreshDefaults, RefreshParams, RunSettings, DEFAULT_TRIGGER, MAX_DEFAULT_WORKERS, MAX_SECONDS,
};
pub(crate) use settings::{seconds, slot_count};
pub use sort::{default_sort_key, SortField, SortKey, SortKeyFn};
