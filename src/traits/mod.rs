//! Core traits shared by the retry machinery and the error types.
//!
//! - [`TransientError`]: classifies failures as worth retrying or permanent
//!
//! # Examples
//!
//! ```
//! use deferred_rail::traits::TransientError;
//! use deferred_rail::{AbortError, TimeoutError};
//! use core::time::Duration;
//!
//! assert!(TimeoutError::new(Duration::from_secs(1)).is_transient());
//! assert!(AbortError::aborted().is_permanent());
//! ```

pub mod transient;

pub use transient::TransientError;
