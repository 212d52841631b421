//! Async combinators.
//!
//! - [`Deferred`]: a future settled from the outside, with optional timeout
//! - [`with_timeout`] / [`abortable`]: race a future against a timer or an
//!   [`AbortSignal`]
//! - [`with_retry`]: re-invoke a failing operation under an attempt limit
//! - [`poll`]: invoke an operation repeatedly until stopped
//! - [`PromiseLock`]: wait until tracked operations have drained
//!
//! # Examples
//!
//! ```
//! use deferred_rail::async_ext::{with_timeout, TimeoutErrorSpec};
//! use deferred_rail::TimeoutError;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let result = with_timeout(
//!     std::future::pending::<Result<(), TimeoutError>>(),
//!     Duration::from_millis(5),
//!     TimeoutErrorSpec::Default,
//! )
//! .await;
//!
//! assert_eq!(result.unwrap_err().to_string(), "operation timed out after 5 ms");
//! # }
//! ```

mod abort;
mod deferred;
mod future_ext;
mod lock;
mod poll;
mod retry;
mod timeout;

pub use abort::{abortable, AbortController, AbortSignal, Abortable};
pub use deferred::{Deferred, DeferredOptions, HookResult, Settlement};
pub use future_ext::FutureRaceExt;
pub use lock::PromiseLock;
pub use poll::{poll, poll_with, PollHandle, PollOptions};
pub use retry::{
    retry_transient, retry_with_sleep, with_retry, Backoff, ExponentialBackoff, FailedAttempt,
    FixedDelay, RetryOptions,
};
pub use timeout::{with_timeout, Timeout, TimeoutErrorSpec};
