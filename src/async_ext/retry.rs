//! Async retry utilities.
//!
//! [`retry_with_sleep`] is runtime-neutral: it accepts a sleep function as a
//! parameter. [`with_retry`] and [`retry_transient`] plug in
//! `tokio::time::sleep`.
//!
//! An operation is invoked at most `retries + 1` times. After every failed
//! attempt the `on_failed_attempt` hook runs (and is awaited), including after
//! the last one. When attempts run out, the last error is returned unmodified.

use core::fmt;
use core::future::Future;
use core::time::Duration;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::traits::TransientError;

/// Computes the delay between a failed attempt and the next one.
pub trait Backoff: Send + Sync {
    /// Returns the delay after failed attempt `attempt_number` (1-based).
    fn delay(&self, attempt_number: u32) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    #[inline]
    fn delay(&self, attempt_number: u32) -> Duration {
        self(attempt_number)
    }
}

/// Fixed delay between attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedDelay {
    /// Delay between retry attempts.
    pub delay: Duration,
}

impl FixedDelay {
    #[inline]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Backoff for FixedDelay {
    #[inline]
    fn delay(&self, _attempt_number: u32) -> Duration {
        self.delay
    }
}

/// Exponential backoff.
///
/// Each retry waits exponentially longer than the previous one, up to a maximum
/// delay.
///
/// # Example
///
/// ```rust
/// use deferred_rail::async_ext::{Backoff, ExponentialBackoff};
/// use core::time::Duration;
///
/// let policy = ExponentialBackoff {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(10),
///     multiplier: 2.0,
/// };
///
/// assert_eq!(policy.delay(1), Duration::from_millis(100));
/// assert_eq!(policy.delay(3), Duration::from_millis(400));
/// ```
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to delay after each attempt.
    pub multiplier: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ExponentialBackoff {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[inline]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[inline]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

impl Backoff for ExponentialBackoff {
    fn delay(&self, attempt_number: u32) -> Duration {
        let exponent = attempt_number.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Details of a failed attempt, handed to `on_failed_attempt`.
#[derive(Debug)]
pub struct FailedAttempt<'a, E> {
    /// 1-based number of the attempt that failed.
    pub attempt_number: u32,
    /// Attempts still allowed after this one.
    pub retries_left: u32,
    /// The error the attempt failed with.
    pub error: &'a E,
}

type FailedAttemptHook<E> =
    Box<dyn for<'a> FnMut(FailedAttempt<'a, E>) -> BoxFuture<'static, ()> + Send>;
type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Attempt limit, backoff and hooks for [`with_retry`].
pub struct RetryOptions<E> {
    retries: u32,
    backoff: Arc<dyn Backoff>,
    should_retry: Option<RetryPredicate<E>>,
    on_failed_attempt: Option<FailedAttemptHook<E>>,
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RETRIES)
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("retries", &self.retries)
            .field("should_retry", &self.should_retry.is_some())
            .field("on_failed_attempt", &self.on_failed_attempt.is_some())
            .finish_non_exhaustive()
    }
}

impl<E> RetryOptions<E> {
    /// Retries used by [`RetryOptions::default`].
    pub const DEFAULT_RETRIES: u32 = 10;

    /// Allows `retries` retries (`retries + 1` attempts) with no delay.
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            backoff: Arc::new(FixedDelay::default()),
            should_retry: None,
            on_failed_attempt: None,
        }
    }

    #[inline]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Waits a fixed `delay` between attempts.
    pub fn delay(self, delay: Duration) -> Self {
        self.backoff(FixedDelay::new(delay))
    }

    /// Uses any [`Backoff`], including closures `Fn(u32) -> Duration`.
    pub fn backoff<B>(mut self, backoff: B) -> Self
    where
        B: Backoff + 'static,
    {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Stops retrying as soon as `predicate` returns `false` for an error.
    pub fn should_retry<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    /// Runs `hook` after every failed attempt and awaits it before going on.
    pub fn on_failed_attempt<H, Fut>(mut self, mut hook: H) -> Self
    where
        H: FnMut(FailedAttempt<'_, E>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        E: 'static,
    {
        let hook: FailedAttemptHook<E> =
            Box::new(move |failure: FailedAttempt<'_, E>| -> BoxFuture<'static, ()> {
                Box::pin(hook(failure))
            });
        self.on_failed_attempt = Some(hook);
        self
    }
}

/// Retries `operation` under `options`, sleeping with `sleep_fn`.
///
/// # Example
///
/// ```rust,ignore
/// use deferred_rail::async_ext::{retry_with_sleep, RetryOptions};
///
/// // With async-std
/// let result = retry_with_sleep(
///     || fetch_data(),
///     RetryOptions::new(3),
///     |d| async_std::task::sleep(d),
/// ).await;
/// ```
pub async fn retry_with_sleep<F, Fut, T, E, S, SFut>(
    mut operation: F,
    options: RetryOptions<E>,
    sleep_fn: S,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let RetryOptions { retries, backoff, should_retry, mut on_failed_attempt } = options;
    let max_attempts = retries.saturating_add(1);
    let mut attempt_number = 1u32;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        let retries_left = max_attempts.saturating_sub(attempt_number);

        if let Some(hook) = on_failed_attempt.as_mut() {
            hook(FailedAttempt { attempt_number, retries_left, error: &error }).await;
        }

        if retries_left == 0 {
            tracing::debug!(attempts = attempt_number, "retry attempts exhausted");
            return Err(error);
        }
        if let Some(predicate) = &should_retry {
            if !predicate(&error) {
                tracing::debug!(attempt = attempt_number, "error not retryable");
                return Err(error);
            }
        }

        let delay = backoff.delay(attempt_number);
        tracing::trace!(
            attempt = attempt_number,
            retries_left,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, retrying"
        );
        if !delay.is_zero() {
            sleep_fn(delay).await;
        }
        attempt_number += 1;
    }
}

/// Retries `operation` under `options` using Tokio's sleep.
///
/// # Example
///
/// ```rust
/// use deferred_rail::async_ext::{with_retry, RetryOptions};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let calls = &AtomicU32::new(0);
/// let result = with_retry(
///     move || async move {
///         if calls.fetch_add(1, Ordering::SeqCst) < 2 { Err("flaky") } else { Ok(42) }
///     },
///     RetryOptions::new(3).delay(Duration::from_millis(1)),
/// )
/// .await;
///
/// assert_eq!(result, Ok(42));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # }
/// ```
pub async fn with_retry<F, Fut, T, E>(operation: F, options: RetryOptions<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with_sleep(operation, options, tokio::time::sleep).await
}

/// Like [`with_retry`], but only retries errors classified as transient.
///
/// Any `should_retry` predicate already set on `options` is replaced.
pub async fn retry_transient<F, Fut, T, E>(operation: F, options: RetryOptions<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: TransientError + 'static,
{
    let options = options.should_retry(|error: &E| error.is_transient());
    with_retry(operation, options).await
}
