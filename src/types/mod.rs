//! Error types and utilities.
//!
//! [`StructuredError`] carries a category name, code, retryability, a fixed
//! creation timestamp and a cause link; [`error_formatter`] renders it together
//! with its cause chain. [`rejection`] holds the failure kinds raised by the
//! async combinators.
//!
//! # Examples
//!
//! ```
//! use deferred_rail::{StructuredError, StructuredErrorOptions};
//!
//! let root = StructuredError::with_options(
//!     "disk full",
//!     StructuredErrorOptions::new().name("StorageError").code("ENOSPC"),
//! );
//! let err = StructuredError::with_options(
//!     "could not save draft",
//!     StructuredErrorOptions::new().name("SaveError").cause_error(root),
//! );
//!
//! assert_eq!(
//!     err.to_string(),
//!     "SaveError: could not save draft\n  Caused by: [ENOSPC] StorageError: disk full"
//! );
//! ```

pub mod error_formatter;
pub mod rejection;
pub mod structured_error;

pub use error_formatter::{
    build_cause_chain, format_cause, stringify_error, CauseChainFormatter, CauseRef,
    ErrorFormatter, FormatOptions,
};
pub use rejection::{AbortError, BoxError, ChunkSizeError, HookError, SharedError, TimeoutError};
pub use structured_error::{Cause, ErrorCode, StructuredError, StructuredErrorOptions};
