//! Failure kinds produced by the library itself.
//!
//! Timeouts and cancellation surface as distinct types so callers can match
//! on them by kind. Operations generic over a caller error `E` absorb these
//! through `From<TimeoutError>` / `From<AbortError>`.

use core::fmt;
use core::time::Duration;
use std::error::Error;
use std::sync::Arc;

/// Shared, thread-safe error object used for causes, reasons and hook failures.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Boxed, thread-safe error object.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Error raised when a timer wins a race against a future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutError {
    duration: Duration,
    message: Option<String>,
}

impl TimeoutError {
    /// Creates a timeout error with the default message.
    #[inline]
    pub fn new(duration: Duration) -> Self {
        Self { duration, message: None }
    }

    /// Creates a timeout error carrying a caller-supplied message.
    #[inline]
    pub fn with_message(duration: Duration, message: impl Into<String>) -> Self {
        Self { duration, message: Some(message.into()) }
    }

    /// The duration the timer was armed with.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The caller-supplied message, if any.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => write!(f, "operation timed out after {} ms", self.duration.as_millis()),
        }
    }
}

impl Error for TimeoutError {}

/// Error raised when a cancellation signal wins a race against a future.
#[derive(Debug, Clone)]
pub enum AbortError {
    /// The signal was cancelled without a reason.
    Aborted,
    /// The signal was cancelled with a caller-supplied reason.
    Reason(SharedError),
}

impl AbortError {
    /// Message used when no reason was supplied.
    pub const DEFAULT_MESSAGE: &'static str = "This operation was aborted";

    /// Builds the generic cancellation error.
    #[inline]
    pub fn aborted() -> Self {
        Self::Aborted
    }

    /// Returns the caller-supplied reason, if any.
    pub fn reason(&self) -> Option<&SharedError> {
        match self {
            Self::Aborted => None,
            Self::Reason(reason) => Some(reason),
        }
    }

    /// Returns `true` if `error` is an [`AbortError`].
    pub fn is_abort_error(error: &(dyn Error + 'static)) -> bool {
        error.is::<AbortError>()
    }
}

impl fmt::Display for AbortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => f.write_str(Self::DEFAULT_MESSAGE),
            Self::Reason(reason) => write!(f, "{}", reason),
        }
    }
}

// Transparent over the reason: display and source both forward to it.
impl Error for AbortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Aborted => None,
            Self::Reason(reason) => reason.source(),
        }
    }
}

/// Error returned synchronously when a chunk size is not a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSizeError(pub usize);

impl fmt::Display for ChunkSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid chunk size {}: expected a positive integer", self.0)
    }
}

impl Error for ChunkSizeError {}

/// Error returned by a deferred lifecycle hook.
///
/// Routed to the `on_error` hook; never affects the deferred's state.
#[derive(Debug)]
pub struct HookError {
    hook: &'static str,
    source: BoxError,
}

impl HookError {
    pub(crate) fn new(hook: &'static str, source: BoxError) -> Self {
        Self { hook, source }
    }

    /// Name of the hook that failed (`on_resolve`, `on_reject` or `on_settle`).
    #[inline]
    pub fn hook(&self) -> &'static str {
        self.hook
    }

    /// Consumes the hook error, returning the underlying failure.
    #[inline]
    pub fn into_source(self) -> BoxError {
        self.source
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hook failed", self.hook)
    }
}

impl Error for HookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}
