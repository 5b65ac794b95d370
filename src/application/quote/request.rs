//! Correlation ids for in-flight market-data requests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::port::RequestId;

/// Tracks which request ids are live in a session.
///
/// Ids are handed out as [`RequestGuard`]s; dropping the guard releases the
/// id, so an id never outlives its request even when the wait is abandoned.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    next_id: AtomicU32,
    /// Live ids mapped to the contract key they were issued for.
    active: Arc<DashMap<RequestId, String>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh id for `label`.
    pub fn register(&self, label: impl Into<String>) -> RequestGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.active.insert(id, label.into());
        RequestGuard {
            id,
            active: Arc::clone(&self.active),
        }
    }

    /// Number of ids currently registered.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Label registered for `id`, if it is live.
    #[must_use]
    pub fn label(&self, id: RequestId) -> Option<String> {
        self.active.get(&id).map(|entry| entry.value().clone())
    }
}

/// A live request id; released on drop.
#[derive(Debug)]
pub struct RequestGuard {
    id: RequestId,
    active: Arc<DashMap<RequestId, String>>,
}

impl RequestGuard {
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.active.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_released_on_drop() {
        let registry = RequestRegistry::new();
        let a = registry.register("AAA|20251219|420|C");
        let b = registry.register("AAA|20251219|420|P");

        assert_ne!(a.id(), b.id());
        assert_eq!(registry.active_count(), 2);
        assert_eq!(registry.label(a.id()).as_deref(), Some("AAA|20251219|420|C"));

        let released = a.id();
        drop(a);
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.label(released), None);

        drop(b);
        assert_eq!(registry.active_count(), 0);
    }
}
