//! Tracker for in-flight operations.

use core::future::Future;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug)]
struct Inner {
    next_id: AtomicU64,
    in_flight: watch::Sender<HashSet<u64>>,
}

/// Tracks operations started through [`run`](PromiseLock::run) so callers
/// can wait for the ones already in flight to finish.
///
/// # Example
///
/// ```rust
/// use deferred_rail::async_ext::PromiseLock;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let lock = PromiseLock::new();
/// let value = lock.run(async { 5 }).await;
///
/// assert_eq!(value, 5);
/// assert!(!lock.is_waiting());
/// lock.wait().await;
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PromiseLock {
    inner: Arc<Inner>,
}

impl Default for PromiseLock {
    fn default() -> Self {
        Self::new()
    }
}

impl PromiseLock {
    pub fn new() -> Self {
        let (in_flight, _) = watch::channel(HashSet::new());
        Self { inner: Arc::new(Inner { next_id: AtomicU64::new(0), in_flight }) }
    }

    /// Runs `future` while tracking it as in flight.
    ///
    /// Tracking ends when the future completes or is dropped.
    pub async fn run<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        let _tracked = self.track();
        future.await
    }

    /// Completes once every operation in flight at the time of the call has
    /// finished, or the lock has been cleared.
    ///
    /// Operations started after the call do not hold it back.
    pub async fn wait(&self) {
        let mut in_flight = self.inner.in_flight.subscribe();
        let pending: Vec<u64> = in_flight.borrow_and_update().iter().copied().collect();
        if pending.is_empty() {
            return;
        }
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = in_flight.wait_for(|current| pending.iter().all(|id| !current.contains(id))).await;
    }

    /// Returns `true` if any tracked operation is in flight.
    pub fn is_waiting(&self) -> bool {
        !self.inner.in_flight.borrow().is_empty()
    }

    /// Forgets every tracked operation; pending [`wait`](Self::wait) calls complete.
    pub fn clear(&self) {
        self.inner.in_flight.send_if_modified(|in_flight| {
            let modified = !in_flight.is_empty();
            in_flight.clear();
            modified
        });
    }

    fn track(&self) -> Tracked<'_> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.in_flight.send_modify(|in_flight| {
            in_flight.insert(id);
        });
        Tracked { inner: &self.inner, id }
    }
}

struct Tracked<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for Tracked<'_> {
    fn drop(&mut self) {
        self.inner.in_flight.send_if_modified(|in_flight| in_flight.remove(&self.id));
    }
}
