//! Cancellation signals and the future that races against them.
//!
//! An [`AbortController`] owns the right to cancel; any number of
//! [`AbortSignal`] clones observe it. [`abortable`] wraps a future so that a
//! cancelled signal wins over the future, even when the future is already
//! complete.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::error::Error;
use std::sync::{Arc, OnceLock};

use pin_project_lite::pin_project;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::types::{AbortError, SharedError};

/// Observable cancellation state with an optional reason.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
    // Set once by whichever abort lands first; `None` records a bare abort.
    reason: Arc<OnceLock<Option<SharedError>>>,
}

impl AbortSignal {
    /// Creates a signal that is already cancelled without a reason.
    pub fn aborted() -> Self {
        let signal = Self::default();
        signal.token.cancel();
        signal
    }

    /// Wraps an existing token. Cancelling the token cancels the signal.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token, reason: Arc::default() }
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The reason recorded by [`AbortController::abort_with`], if any.
    pub fn reason(&self) -> Option<&SharedError> {
        self.reason.get().and_then(Option::as_ref)
    }

    /// The error a race against this signal rejects with.
    ///
    /// Once the signal is cancelled the answer is fixed: a reason supplied
    /// afterwards is ignored.
    pub fn error(&self) -> AbortError {
        let reason = if self.is_aborted() {
            self.reason.get_or_init(|| None)
        } else {
            match self.reason.get() {
                Some(reason) => reason,
                None => return AbortError::Aborted,
            }
        };
        match reason {
            Some(reason) => AbortError::Reason(reason.clone()),
            None => AbortError::Aborted,
        }
    }

    /// Completes once the signal is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// The underlying token, for APIs that take one directly.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Owner of the cancellation capability for an [`AbortSignal`].
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a signal observing this controller.
    #[inline]
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.signal.is_aborted()
    }

    /// Cancels without a reason. Repeated calls have no further effect.
    pub fn abort(&self) {
        self.settle(None);
    }

    /// Cancels with `reason`. Ignored if the signal is already cancelled.
    pub fn abort_with<R>(&self, reason: R)
    where
        R: Error + Send + Sync + 'static,
    {
        self.abort_with_shared(Arc::new(reason));
    }

    /// Cancels with an already shared `reason`.
    pub fn abort_with_shared(&self, reason: SharedError) {
        if self.signal.is_aborted() {
            return;
        }
        self.settle(Some(reason));
    }

    // Recording the outcome before cancelling keeps `error()` stable for
    // concurrent callers: the first write wins.
    fn settle(&self, reason: Option<SharedError>) {
        if self.signal.reason.set(reason).is_ok() {
            tracing::debug!("abort requested");
        }
        self.signal.token.cancel();
    }
}

pin_project! {
    /// Future returned by [`abortable`].
    #[must_use = "futures do nothing unless polled"]
    pub struct Abortable<F> {
        #[pin]
        future: F,
        #[pin]
        cancelled: Option<WaitForCancellationFutureOwned>,
        signal: Option<AbortSignal>,
    }
}

impl<F, T, E> Future for Abortable<F>
where
    F: Future<Output = Result<T, E>>,
    E: From<AbortError>,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        // The signal is checked before the future so a requested cancellation
        // always wins.
        if let (Some(signal), Some(cancelled)) = (this.signal.as_ref(), this.cancelled.as_pin_mut()) {
            if cancelled.poll(cx).is_ready() {
                return Poll::Ready(Err(signal.error().into()));
            }
        }

        this.future.poll(cx)
    }
}

/// Races `future` against `signal`.
///
/// Without a signal the future's own outcome passes through unchanged. With
/// an already cancelled signal the result is the cancellation error on the
/// first poll, without polling `future`. The cancellation listener lives
/// inside the returned future and is released when it completes or is
/// dropped.
///
/// # Example
///
/// ```rust
/// use deferred_rail::async_ext::{abortable, AbortController};
/// use deferred_rail::AbortError;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let controller = AbortController::new();
/// controller.abort();
///
/// let result = abortable(async { Ok::<_, AbortError>(1) }, Some(&controller.signal())).await;
/// assert!(matches!(result, Err(AbortError::Aborted)));
/// # }
/// ```
pub fn abortable<F, T, E>(future: F, signal: Option<&AbortSignal>) -> Abortable<F>
where
    F: Future<Output = Result<T, E>>,
    E: From<AbortError>,
{
    Abortable {
        future,
        cancelled: signal.map(|signal| signal.token.clone().cancelled_owned()),
        signal: signal.cloned(),
    }
}
