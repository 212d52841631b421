//! Cause chain formatting.
//!
//! Renders an error and its nested causes as
//!
//! ```text
//! [code] Name: message
//!   Caused by: <cause>
//!   Caused by: <cause>
//! ```
//!
//! Each formatting pass keeps its own visited set keyed by object identity, so
//! cyclic cause links end in [`CIRCULAR_PLACEHOLDER`] instead of looping.

use core::fmt::Display;
use std::error::Error;

use serde_json::Value;
use smallvec::SmallVec;

use crate::types::structured_error::{Cause, StructuredError};

/// Separator placed between cause chain entries.
pub const CAUSE_SEPARATOR: &str = "\n  Caused by: ";
/// Emitted when a cause has already been rendered in the current pass.
pub const CIRCULAR_PLACEHOLDER: &str = "[Circular reference detected]";
/// Emitted when the depth limit is reached while further causes exist.
pub const TRUNCATED_PLACEHOLDER: &str = "[Additional causes truncated...]";
/// Rendering of an object value that has no string form.
pub const OBJECT_PLACEHOLDER: &str = "[object Object]";

type Parts = SmallVec<[String; 4]>;

/// Trait for customizing how chain entries are joined.
pub trait ErrorFormatter {
    fn format_item(&self, item: &dyn Display) -> String {
        item.to_string()
    }

    fn separator(&self) -> &str {
        CAUSE_SEPARATOR
    }

    fn format_chain<'a>(&self, chain: impl Iterator<Item = &'a dyn Display>) -> String {
        chain.map(|item| self.format_item(item)).collect::<Vec<_>>().join(self.separator())
    }
}

/// Options for [`stringify_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub include_code: bool,
    pub include_cause: bool,
    pub max_cause_depth: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { include_code: true, include_cause: true, max_cause_depth: 3 }
    }
}

impl FormatOptions {
    #[inline]
    pub fn no_code() -> Self {
        Self { include_code: false, ..Default::default() }
    }

    #[inline]
    pub fn no_cause() -> Self {
        Self { include_cause: false, ..Default::default() }
    }

    #[inline]
    pub fn with_max_cause_depth(mut self, depth: usize) -> Self {
        self.max_cause_depth = depth;
        self
    }
}

/// Borrowed view of one link in a cause chain.
#[derive(Clone, Copy)]
pub enum CauseRef<'a> {
    Error(&'a (dyn Error + 'static)),
    Value(&'a Value),
}

impl<'a> From<&'a Cause> for CauseRef<'a> {
    fn from(cause: &'a Cause) -> Self {
        match cause {
            Cause::Error(error) => CauseRef::Error(error.as_ref()),
            Cause::Value(value) => CauseRef::Value(value),
        }
    }
}

impl<'a> CauseRef<'a> {
    /// The next link: a structured error's cause, or a foreign error's `source()`.
    /// Values end the chain.
    fn next(self) -> Option<CauseRef<'a>> {
        match self {
            CauseRef::Value(_) => None,
            CauseRef::Error(error) => match error.downcast_ref::<StructuredError>() {
                Some(structured) => structured.cause().map(CauseRef::from),
                None => error.source().map(CauseRef::Error),
            },
        }
    }
}

/// Formatter that renders an error followed by its cause chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct CauseChainFormatter {
    options: FormatOptions,
}

impl CauseChainFormatter {
    #[inline]
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Formats `error` as the error being stringified directly.
    pub fn format(&self, error: &(dyn Error + 'static)) -> String {
        let mut result = match error.downcast_ref::<StructuredError>() {
            Some(structured) => headline(structured, self.options.include_code),
            None => error.to_string(),
        };

        if self.options.include_cause {
            if let Some(cause) = CauseRef::Error(error).next() {
                let chain = self.format_causes(cause);
                if !chain.is_empty() {
                    result.push_str(self.separator());
                    result.push_str(&chain);
                }
            }
        }

        result
    }

    /// Formats a cause chain starting at `cause`, without a leading separator.
    pub fn format_causes(&self, cause: CauseRef<'_>) -> String {
        let depth = self.options.max_cause_depth;
        if depth == 0 {
            return String::new();
        }

        let parts = collect_chain(cause, depth);
        self.format_chain(parts.iter().map(|part| part as &dyn Display))
    }
}

impl ErrorFormatter for CauseChainFormatter {}

fn collect_chain(start: CauseRef<'_>, max_depth: usize) -> Parts {
    // Keyed on the wide pointer: a newtype and its inner source share an address.
    let mut visited: SmallVec<[*const (dyn Error + 'static); 4]> = SmallVec::new();
    let mut parts = Parts::new();
    let mut current = Some(start);
    let mut depth = 0;

    while let Some(cause) = current {
        if depth >= max_depth {
            parts.push(TRUNCATED_PLACEHOLDER.to_string());
            break;
        }

        match cause {
            CauseRef::Value(value) => {
                parts.push(value_to_string(value));
                break;
            },
            CauseRef::Error(error) => {
                let identity: *const (dyn Error + 'static) = error;
                if visited.iter().any(|seen| core::ptr::eq(*seen, identity)) {
                    parts.push(CIRCULAR_PLACEHOLDER.to_string());
                    break;
                }
                visited.push(identity);
                parts.push(format_cause(cause));
            },
        }

        current = cause.next();
        depth += 1;
    }

    parts
}

fn headline(error: &StructuredError, include_code: bool) -> String {
    match error.code() {
        Some(code) if include_code => format!("[{}] {}: {}", code, error.name(), error.message()),
        _ => format!("{}: {}", error.name(), error.message()),
    }
}

/// Formats a single cause as it appears inside a chain.
///
/// Structured errors always carry their `[code]` prefix here when a code
/// is set; other errors use their display text.
pub fn format_cause(cause: CauseRef<'_>) -> String {
    match cause {
        CauseRef::Value(value) => value_to_string(value),
        CauseRef::Error(error) => match error.downcast_ref::<StructuredError>() {
            Some(structured) => headline(structured, true),
            None => error.to_string(),
        },
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => OBJECT_PLACEHOLDER.to_string(),
    }
}

/// Renders `error` and its causes according to `options`.
pub fn stringify_error(error: &(dyn Error + 'static), options: &FormatOptions) -> String {
    CauseChainFormatter::new(*options).format(error)
}

/// Renders the chain starting at `cause`, following at most `max_depth` links.
///
/// Returns an empty string when `max_depth` is zero.
pub fn build_cause_chain(cause: CauseRef<'_>, max_depth: usize) -> String {
    CauseChainFormatter::new(FormatOptions::default().with_max_cause_depth(max_depth))
        .format_causes(cause)
}
