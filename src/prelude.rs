//! Convenience re-exports for common usage patterns.
//!
//! ```
//! use deferred_rail::prelude::*;
//! ```
//!
//! # What's Included
//!
//! - **Async**: [`Deferred`], [`with_timeout`], [`abortable`], [`with_retry`],
//!   [`poll`], [`PromiseLock`] and the [`FutureRaceExt`] adapter
//! - **Streams**: [`merge`], [`chunk`]
//! - **Errors**: [`StructuredError`], [`stringify_error`], [`TimeoutError`],
//!   [`AbortError`], [`TransientError`]

pub use crate::async_ext::{
    abortable, poll, poll_with, retry_transient, with_retry, with_timeout, AbortController,
    AbortSignal, Deferred, DeferredOptions, ExponentialBackoff, FutureRaceExt, PollHandle,
    PollOptions, PromiseLock, RetryOptions, Settlement, TimeoutErrorSpec,
};
pub use crate::stream::{chunk, merge, ChunkOptions};
pub use crate::traits::TransientError;
pub use crate::types::{
    build_cause_chain, stringify_error, AbortError, FormatOptions, StructuredError,
    StructuredErrorOptions, TimeoutError,
};
