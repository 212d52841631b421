//! Races a future against a timer.
//!
//! The first of the two to complete decides the outcome. When the future
//! wins, the timer is dropped with the [`Timeout`] wrapper so nothing fires
//! later. When the timer wins, the wrapped future is dropped unobserved.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use core::time::Duration;
use std::borrow::Cow;

use pin_project_lite::pin_project;
use tokio::time::Sleep;

use crate::types::TimeoutError;

/// Describes the error produced when a timer fires.
///
/// Factories are evaluated lazily, only if the timer actually fires.
pub enum TimeoutErrorSpec<E> {
    /// A [`TimeoutError`] with the default message.
    Default,
    /// A [`TimeoutError`] carrying this message.
    Message(Cow<'static, str>),
    /// A prebuilt error, used verbatim.
    Error(E),
    /// Produces one of the other forms on demand.
    Factory(Box<dyn FnOnce() -> TimeoutErrorSpec<E> + Send>),
}

impl<E> TimeoutErrorSpec<E> {
    pub fn message(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Message(message.into())
    }

    pub fn error(error: E) -> Self {
        Self::Error(error)
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: FnOnce() -> TimeoutErrorSpec<E> + Send + 'static,
    {
        Self::Factory(Box::new(factory))
    }

    /// Shorthand for a factory that always builds an error value.
    pub fn error_factory<F>(factory: F) -> Self
    where
        F: FnOnce() -> E + Send + 'static,
    {
        Self::Factory(Box::new(move || Self::Error(factory())))
    }

    /// Resolves the spec into the error to reject with.
    pub fn into_error(self, duration: Duration) -> E
    where
        E: From<TimeoutError>,
    {
        match self {
            Self::Default => TimeoutError::new(duration).into(),
            Self::Message(message) => TimeoutError::with_message(duration, message).into(),
            Self::Error(error) => error,
            Self::Factory(factory) => factory().into_error(duration),
        }
    }
}

impl<E> Default for TimeoutErrorSpec<E> {
    fn default() -> Self {
        Self::Default
    }
}

impl<E> From<&'static str> for TimeoutErrorSpec<E> {
    fn from(message: &'static str) -> Self {
        Self::Message(Cow::Borrowed(message))
    }
}

impl<E> From<String> for TimeoutErrorSpec<E> {
    fn from(message: String) -> Self {
        Self::Message(Cow::Owned(message))
    }
}

impl<E: fmt::Debug> fmt::Debug for TimeoutErrorSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Message(message) => f.debug_tuple("Message").field(message).finish(),
            Self::Error(error) => f.debug_tuple("Error").field(error).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

pin_project! {
    /// Future returned by [`with_timeout`].
    #[must_use = "futures do nothing unless polled"]
    pub struct Timeout<F, E> {
        #[pin]
        future: F,
        #[pin]
        delay: Option<Sleep>,
        duration: Duration,
        spec: Option<TimeoutErrorSpec<E>>,
    }
}

impl<F, E> Timeout<F, E> {
    /// The duration the timer was armed with (zero when unarmed).
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns `true` if a timer is armed.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.delay.is_some()
    }
}

impl<F, T, E> Future for Timeout<F, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(output) = this.future.poll(cx) {
            return Poll::Ready(output);
        }

        let Some(delay) = this.delay.as_pin_mut() else {
            return Poll::Pending;
        };

        match delay.poll(cx) {
            Poll::Ready(()) => {
                let duration = *this.duration;
                tracing::debug!(timeout_ms = duration.as_millis() as u64, "timer fired before future settled");
                let spec = this.spec.take().unwrap_or_default();
                Poll::Ready(Err(spec.into_error(duration)))
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Bounds `future` by `duration`.
///
/// A zero `duration` arms no timer: the result tracks `future` indefinitely.
/// Otherwise the timer starts now, and if it fires first the result is the
/// error described by `spec`.
///
/// # Panics
///
/// Panics if a non-zero timer is armed outside a Tokio runtime with the time
/// driver enabled.
///
/// # Example
///
/// ```rust
/// use deferred_rail::async_ext::with_timeout;
/// use deferred_rail::TimeoutError;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let slow = async {
///     tokio::time::sleep(Duration::from_secs(5)).await;
///     Ok::<_, TimeoutError>(1)
/// };
///
/// let err = with_timeout(slow, Duration::from_millis(10), "lookup took too long")
///     .await
///     .unwrap_err();
/// assert_eq!(err.to_string(), "lookup took too long");
/// # }
/// ```
pub fn with_timeout<F, T, E, S>(future: F, duration: Duration, spec: S) -> Timeout<F, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
    S: Into<TimeoutErrorSpec<E>>,
{
    let delay = (!duration.is_zero()).then(|| tokio::time::sleep(duration));
    Timeout { future, delay, duration, spec: Some(spec.into()) }
}
