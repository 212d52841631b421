//! Self-rescheduling polling loop.
//!
//! The loop invokes the operation, waits `delay`, and repeats until stopped.
//! Invocations never overlap: an operation that never completes stalls the
//! loop on that cycle. An operation error ends the loop; it is not retried,
//! and it is only observable through [`PollHandle::finished`].

use core::future::Future;
use core::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Options for [`poll_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Wait between the end of one invocation and the start of the next.
    pub delay: Duration,
    /// Invoke right away instead of waiting `delay` first.
    pub immediately: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self { delay: Duration::ZERO, immediately: true }
    }
}

impl PollOptions {
    #[inline]
    pub fn new(delay: Duration) -> Self {
        Self { delay, ..Default::default() }
    }

    #[inline]
    pub fn immediately(mut self, immediately: bool) -> Self {
        self.immediately = immediately;
        self
    }
}

/// Stop handle for a running poll loop.
///
/// Dropping the handle does not stop the loop.
#[derive(Debug)]
pub struct PollHandle<E> {
    token: CancellationToken,
    task: JoinHandle<Result<(), E>>,
}

impl<E> PollHandle<E> {
    /// Prevents any further invocation, including one already scheduled.
    ///
    /// An invocation in progress runs to completion. Calling `stop` again has
    /// no further effect.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("poller stop requested");
        }
        self.token.cancel();
    }

    /// Returns `true` until the loop has been stopped or has ended.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }

    /// Waits for the loop to end.
    ///
    /// Yields the operation error that ended it, or `Ok(())` after a stop.
    /// A panic inside the operation is resumed here.
    pub async fn finished(self) -> Result<(), E> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Ok(()),
        }
    }
}

/// Starts polling `operation` every `delay`.
///
/// With `immediately` the first invocation happens right away; otherwise the
/// loop waits `delay` first.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn poll<F, Fut, E>(operation: F, delay: Duration, immediately: bool) -> PollHandle<E>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Send + 'static,
{
    poll_with(operation, PollOptions { delay, immediately })
}

/// Starts polling `operation` according to `options`.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
///
/// # Example
///
/// ```rust
/// use deferred_rail::async_ext::{poll_with, PollOptions};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ticks = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&ticks);
///
/// let handle = poll_with(
///     move || {
///         let counter = Arc::clone(&counter);
///         async move {
///             counter.fetch_add(1, Ordering::SeqCst);
///             Ok::<_, std::io::Error>(())
///         }
///     },
///     PollOptions::new(Duration::from_millis(5)),
/// );
///
/// tokio::time::sleep(Duration::from_millis(20)).await;
/// handle.stop();
/// handle.finished().await.unwrap();
/// assert!(ticks.load(Ordering::SeqCst) >= 1);
/// # }
/// ```
pub fn poll_with<F, Fut, E>(mut operation: F, options: PollOptions) -> PollHandle<E>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Send + 'static,
{
    let token = CancellationToken::new();
    let stopped = token.clone();
    let PollOptions { delay, immediately } = options;

    let task = tokio::spawn(async move {
        tracing::debug!(delay_ms = delay.as_millis() as u64, immediately, "poller started");
        if !immediately && !wait_unless_stopped(&stopped, delay).await {
            return Ok(());
        }

        loop {
            if stopped.is_cancelled() {
                tracing::debug!("poller stopped");
                return Ok(());
            }
            if let Err(err) = operation().await {
                tracing::debug!("poll operation failed, poller terminated");
                return Err(err);
            }
            if stopped.is_cancelled() || !wait_unless_stopped(&stopped, delay).await {
                tracing::debug!("poller stopped");
                return Ok(());
            }
        }
    });

    PollHandle { token, task }
}

/// Sleeps for `delay`; returns `false` if stopped first.
async fn wait_unless_stopped(stopped: &CancellationToken, delay: Duration) -> bool {
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return !stopped.is_cancelled();
    }
    stopped.run_until_cancelled(tokio::time::sleep(delay)).await.is_some()
}
