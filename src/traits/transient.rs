//! Transient error classification for retry strategies.
//!
//! [`retry_transient`](crate::async_ext::retry_transient) consults this trait
//! to decide whether a failed attempt is worth repeating.
//!
//! # Examples
//!
//! ```
//! use deferred_rail::traits::TransientError;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     NetworkTimeout,
//!     RateLimited { retry_after_ms: u64 },
//!     InvalidInput,
//! }
//!
//! impl TransientError for MyError {
//!     fn is_transient(&self) -> bool {
//!         matches!(self, MyError::NetworkTimeout | MyError::RateLimited { .. })
//!     }
//!
//!     fn retry_after_hint(&self) -> Option<core::time::Duration> {
//!         match self {
//!             MyError::RateLimited { retry_after_ms } => {
//!                 Some(core::time::Duration::from_millis(*retry_after_ms))
//!             }
//!             _ => None,
//!         }
//!     }
//! }
//!
//! assert!(MyError::NetworkTimeout.is_transient());
//! assert!(MyError::InvalidInput.is_permanent());
//! ```

use core::time::Duration;

use crate::types::{AbortError, StructuredError, TimeoutError};

/// Classification of errors as transient or permanent.
///
/// Transient errors are temporary failures that may succeed if retried,
/// such as network timeouts, rate limiting, or temporary service unavailability.
pub trait TransientError {
    /// Returns `true` if this error is transient and may succeed on retry.
    fn is_transient(&self) -> bool;

    /// Returns `true` if this error is permanent and should not be retried.
    ///
    /// Default implementation returns `!self.is_transient()`.
    #[inline]
    fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Optional hint for how long to wait before retrying.
    ///
    /// Returns `None` by default, indicating no specific wait time is suggested.
    #[inline]
    fn retry_after_hint(&self) -> Option<Duration> {
        None
    }
}

impl TransientError for std::io::Error {
    fn is_transient(&self) -> bool {
        use std::io::ErrorKind;
        matches!(
            self.kind(),
            ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::TimedOut
                | ErrorKind::Interrupted
                | ErrorKind::WouldBlock
        )
    }
}

/// Timeouts leave the decision to retry with the caller; they classify as transient.
impl TransientError for TimeoutError {
    #[inline]
    fn is_transient(&self) -> bool {
        true
    }
}

/// Cancellation is never retried automatically.
impl TransientError for AbortError {
    #[inline]
    fn is_transient(&self) -> bool {
        false
    }
}

/// Follows the `retryable` flag; an unset flag counts as transient.
///
/// A numeric `retry_after_ms` field attached with
/// [`with_value`](StructuredError::with_value) is reported as the retry hint.
impl TransientError for StructuredError {
    #[inline]
    fn is_transient(&self) -> bool {
        self.retryable().unwrap_or(true)
    }

    fn retry_after_hint(&self) -> Option<Duration> {
        self.field("retry_after_ms").and_then(|value| value.as_u64()).map(Duration::from_millis)
    }
}
