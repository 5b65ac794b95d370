//! Shared concurrency gate for gateway calls.
//!
//! A [`RefreshThrottle`] combines an optional counting semaphore (bounding
//! in-flight calls) with global minimum-interval pacing between call starts.
//! One throttle is created per pipeline run and shared by reference with
//! every task of that run.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, Instant};

/// Throttle limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleSettings {
    /// Maximum concurrent calls; `None` means unbounded.
    pub max_inflight: Option<usize>,
    /// Minimum spacing between consecutive call starts, across all workers.
    pub min_interval: Duration,
}

/// Counting semaphore plus start-time pacing.
#[derive(Debug)]
pub struct RefreshThrottle {
    slots: Option<Arc<Semaphore>>,
    min_interval: Duration,
    /// Start time of the most recent call. Held across the pacing wait so
    /// that starts are serialized.
    last_start: Mutex<Option<Instant>>,
}

/// Scope guard for one gateway call; dropping it frees the slot.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct ThrottlePermit {
    _slot: Option<OwnedSemaphorePermit>,
}

impl RefreshThrottle {
    /// Create a throttle. `max_inflight` is clamped to
    /// `1..=Semaphore::MAX_PERMITS`.
    pub fn new(settings: ThrottleSettings) -> Self {
        Self {
            slots: settings
                .max_inflight
                .map(|limit| Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS)))),
            min_interval: settings.min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// A throttle that never waits.
    pub fn unbounded() -> Self {
        Self::new(ThrottleSettings::default())
    }

    /// Wait for a free slot, then for the pacing interval.
    ///
    /// Never fails; the semaphore is never closed.
    pub async fn acquire(&self) -> ThrottlePermit {
        let slot = match &self.slots {
            Some(slots) => Arc::clone(slots).acquire_owned().await.ok(),
            None => None,
        };

        if !self.min_interval.is_zero() {
            let mut last_start = self.last_start.lock().await;
            if let Some(previous) = *last_start {
                let remaining = self.min_interval.saturating_sub(previous.elapsed());
                if !remaining.is_zero() {
                    sleep(remaining).await;
                }
            }
            *last_start = Some(Instant::now());
        }

        ThrottlePermit { _slot: slot }
    }

    /// Free slots right now, or `None` when unbounded.
    #[must_use]
    pub fn available_slots(&self) -> Option<usize> {
        self.slots.as_ref().map(|slots| slots.available_permits())
    }
}
