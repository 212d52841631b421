//! Extension trait for `Future<Output = Result<T, E>>`.
//!
//! Provides `.with_timeout()` and `.with_signal()` as method-call forms of
//! [`with_timeout`](super::with_timeout) and [`abortable`](super::abortable).

use core::future::Future;
use core::time::Duration;

use crate::types::{AbortError, TimeoutError};

use super::abort::{abortable, AbortSignal, Abortable};
use super::timeout::{with_timeout, Timeout, TimeoutErrorSpec};

/// Extension trait racing `Result`-returning futures against timers and
/// cancellation signals.
///
/// # Examples
///
/// ```rust
/// use deferred_rail::prelude::*;
/// use std::time::Duration;
///
/// #[derive(Debug)]
/// enum FetchError {
///     Timeout(TimeoutError),
///     Aborted(AbortError),
/// }
///
/// impl From<TimeoutError> for FetchError {
///     fn from(err: TimeoutError) -> Self { FetchError::Timeout(err) }
/// }
///
/// impl From<AbortError> for FetchError {
///     fn from(err: AbortError) -> Self { FetchError::Aborted(err) }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let controller = AbortController::new();
/// let result = async { Ok::<_, FetchError>("body") }
///     .with_signal(Some(&controller.signal()))
///     .with_timeout(Duration::from_secs(1), TimeoutErrorSpec::Default)
///     .await;
///
/// assert_eq!(result.unwrap(), "body");
/// # }
/// ```
pub trait FutureRaceExt<T, E>: Future<Output = Result<T, E>> + Sized {
    /// Bounds the future by `duration`; see [`with_timeout`](super::with_timeout).
    fn with_timeout<S>(self, duration: Duration, spec: S) -> Timeout<Self, E>
    where
        E: From<TimeoutError>,
        S: Into<TimeoutErrorSpec<E>>,
    {
        with_timeout(self, duration, spec)
    }

    /// Races the future against `signal`; see [`abortable`](super::abortable).
    fn with_signal(self, signal: Option<&AbortSignal>) -> Abortable<Self>
    where
        E: From<AbortError>,
    {
        abortable(self, signal)
    }
}

impl<Fut, T, E> FutureRaceExt<T, E> for Fut where Fut: Future<Output = Result<T, E>> {}
