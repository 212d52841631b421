//! Deferred futures, cancellation races and structured errors.
//!
//! The crate has two halves:
//!
//! - **Async primitives** ([`async_ext`], [`stream`]): a [`Deferred`] settled
//!   from the outside, timeout and abort races, retry with backoff, a polling
//!   loop, an in-flight tracker, and the `merge` / `chunk` stream combinators.
//! - **Error model** ([`types`], [`traits`]): [`StructuredError`] carrying a
//!   name, code, retryability, timestamp and cause, rendered with its cause
//!   chain by the [`error_formatter`](types::error_formatter) functions.
//!
//! # Examples
//!
//! ## Settling a deferred with a timeout
//!
//! ```
//! use deferred_rail::prelude::*;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let deferred: Deferred<u32, TimeoutError> = Deferred::with_timeout(
//!     Duration::from_millis(10),
//!     TimeoutErrorSpec::message("no reply"),
//!     DeferredOptions::default(),
//! );
//!
//! let err = deferred.wait().await.unwrap_err();
//! assert_eq!(err.to_string(), "no reply");
//! # }
//! ```
//!
//! ## Retrying a flaky call
//!
//! ```
//! use deferred_rail::prelude::*;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let calls = &AtomicU32::new(0);
//! let result = with_retry(
//!     move || async move {
//!         if calls.fetch_add(1, Ordering::SeqCst) == 0 { Err("busy") } else { Ok("done") }
//!     },
//!     RetryOptions::new(2),
//! )
//! .await;
//!
//! assert_eq!(result, Ok("done"));
//! # }
//! ```
//!
//! ## Rendering a cause chain
//!
//! ```
//! use deferred_rail::{stringify_error, FormatOptions, StructuredError, StructuredErrorOptions};
//!
//! let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
//! let err = StructuredError::with_options(
//!     "sync failed",
//!     StructuredErrorOptions::new().code(503).cause_error(io),
//! );
//!
//! assert_eq!(
//!     stringify_error(&err, &FormatOptions::default()),
//!     "[503] StructuredError: sync failed\n  Caused by: connection reset"
//! );
//! ```

/// Deferred futures, timeout/abort races, retry, polling and in-flight tracking
pub mod async_ext;
/// Convenience re-exports for quick starts
pub mod prelude;
/// Stream fan-in and batching
pub mod stream;
/// Error classification traits
pub mod traits;
/// StructuredError, the cause-chain formatter and rejection types
pub mod types;

pub use async_ext::{AbortController, AbortSignal, Deferred, DeferredOptions, Settlement};
pub use traits::*;
pub use types::*;
