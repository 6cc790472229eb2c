use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Coarse "a batch is in flight" flag, observable by any number of readers.
///
/// Cloning yields another handle to the same flag.
#[derive(Clone)]
pub struct LoadingState {
    tx: Arc<watch::Sender<bool>>,
    active_batches: Arc<AtomicUsize>,
}

impl LoadingState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            active_batches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_loading(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Mark a batch as started and raise the flag.
    ///
    /// The batch counts as active until the returned guard is dropped, which
    /// includes the batch future being cancelled part way through.
    pub(crate) fn begin_batch(&self) -> BatchGuard {
        self.active_batches.fetch_add(1, Ordering::SeqCst);
        self.tx.send_replace(true);
        BatchGuard {
            state: self.clone(),
        }
    }

    /// Lower the flag regardless of what else is in flight.
    pub(crate) fn clear(&self) {
        self.tx.send_replace(false);
    }

    /// Mark a batch as settled. The flag drops once no batch remains active.
    fn end_batch(&self) {
        if self.active_batches.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tx.send_replace(false);
        }
    }
}

/// Keeps one batch counted as active while alive.
#[must_use = "the batch ends as soon as the guard is dropped"]
pub(crate) struct BatchGuard {
    state: LoadingState,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.state.end_batch();
    }
}

impl Default for LoadingState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_batches() {
        let loading = LoadingState::new();
        assert!(!loading.is_loading());

        let first = loading.begin_batch();
        let second = loading.begin_batch();
        drop(first);
        assert!(loading.is_loading());
        drop(second);
        assert!(!loading.is_loading());
    }

    #[test]
    fn test_clear_ignores_active_batches() {
        let loading = LoadingState::new();
        let _batch = loading.begin_batch();
        loading.clear();
        assert!(!loading.is_loading());
    }

    #[test]
    fn test_dropped_guard_does_not_pin_later_batches() {
        let loading = LoadingState::new();
        {
            let _abandoned = loading.begin_batch();
        }
        let next = loading.begin_batch();
        assert!(loading.is_loading());
        drop(next);
        assert!(!loading.is_loading());
    }

    #[tokio::test]
    async fn test_subscriber_sees_transitions() {
        let loading = LoadingState::new();
        let mut rx = loading.subscribe();
        let handle = loading.clone();

        let batch = handle.begin_batch();
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        drop(batch);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());
    }
}
