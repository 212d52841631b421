//! Structured error type with code, retryability, timestamp and a cause link.
//!
//! [`StructuredError`] is the carrying mechanism for caller-defined error
//! categories: the library imposes no fixed enumeration, only the fields.
//!
//! # Examples
//!
//! ```
//! use deferred_rail::{StructuredError, StructuredErrorOptions};
//!
//! let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
//! let err = StructuredError::with_options(
//!     "failed to fetch user",
//!     StructuredErrorOptions::new()
//!         .name("NetworkError")
//!         .code("E_FETCH")
//!         .retryable(true)
//!         .cause_error(io),
//! )
//! .with_value("user_id", 42);
//!
//! assert_eq!(
//!     err.to_string(),
//!     "[E_FETCH] NetworkError: failed to fetch user\n  Caused by: connection reset"
//! );
//! assert_eq!(err.field("user_id"), Some(&serde_json::json!(42)));
//! ```

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::types::error_formatter::{stringify_error, FormatOptions};
use crate::types::rejection::SharedError;

/// Identifier attached to a [`StructuredError`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Textual code such as `"E_TIMEOUT"`.
    Text(Cow<'static, str>),
    /// Numeric code such as `404`.
    Number(i64),
    /// Opaque token compared by its description, rendered as `Symbol(desc)`.
    Symbol(&'static str),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{}", number),
            Self::Symbol(desc) => write!(f, "Symbol({})", desc),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(number) => serializer.serialize_i64(*number),
            other => serializer.collect_str(other),
        }
    }
}

impl From<&'static str> for ErrorCode {
    fn from(value: &'static str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }
}

impl From<String> for ErrorCode {
    fn from(value: String) -> Self {
        Self::Text(Cow::Owned(value))
    }
}

impl From<i64> for ErrorCode {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ErrorCode {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for ErrorCode {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

/// The value linked as the cause of a [`StructuredError`].
#[derive(Debug, Clone)]
pub enum Cause {
    /// Any error value, including another [`StructuredError`].
    Error(SharedError),
    /// A non-error value (string, number, object, ...).
    Value(Value),
}

impl Cause {
    /// Wraps an error value.
    pub fn error<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Error(Arc::new(error))
    }

    /// Wraps an already shared error value, preserving its identity.
    #[inline]
    pub fn shared(error: SharedError) -> Self {
        Self::Error(error)
    }

    /// Wraps a non-error value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Returns the cause as an error object, if it is one.
    pub fn as_error(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Error(error) => Some(error.as_ref()),
            Self::Value(_) => None,
        }
    }

    /// Returns the cause as a [`StructuredError`], if it is one.
    pub fn as_structured(&self) -> Option<&StructuredError> {
        self.as_error().and_then(|error| error.downcast_ref::<StructuredError>())
    }
}

/// Options bag accepted by [`StructuredError::with_options`].
#[derive(Debug, Clone, Default)]
pub struct StructuredErrorOptions {
    name: Option<Cow<'static, str>>,
    code: Option<ErrorCode>,
    retryable: Option<bool>,
    cause: Option<Cause>,
}

impl StructuredErrorOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the category label. Defaults to [`StructuredError::DEFAULT_NAME`].
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    pub fn cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn cause_error<E>(self, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.cause(Cause::error(error))
    }

    pub fn cause_value(self, value: impl Into<Value>) -> Self {
        self.cause(Cause::value(value))
    }
}

/// Error value carrying a category name, code, retryability, creation
/// timestamp and an optional cause.
///
/// The timestamp is captured at construction and never changes. Additional
/// diagnostic fields can be attached while building the error with
/// [`with_value`](Self::with_value); there is no way to mutate an error after
/// it has been shared.
#[must_use]
#[derive(Debug, Clone)]
pub struct StructuredError {
    name: Cow<'static, str>,
    message: String,
    code: Option<ErrorCode>,
    retryable: Option<bool>,
    timestamp: DateTime<Utc>,
    cause: Option<Cause>,
    fields: Vec<(String, Value)>,
    backtrace: Arc<Backtrace>,
}

impl StructuredError {
    /// Name used when no category label is given.
    pub const DEFAULT_NAME: &'static str = "StructuredError";

    /// Creates an error with default options.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_options(message, StructuredErrorOptions::default())
    }

    /// Creates an error from a message and an options bag.
    pub fn with_options(message: impl Into<String>, options: StructuredErrorOptions) -> Self {
        Self {
            name: options.name.unwrap_or(Cow::Borrowed(Self::DEFAULT_NAME)),
            message: message.into(),
            code: options.code,
            retryable: options.retryable,
            timestamp: Utc::now(),
            cause: options.cause,
            fields: Vec::new(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    /// Attaches a named diagnostic field.
    ///
    /// Values that serialize to `null` (such as `None`) are ignored. A key can
    /// only be attached once; later values for the same key are ignored.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let key = key.into();
        let value = match serde_json::to_value(value) {
            Ok(Value::Null) => return self,
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(field = %key, error = %err, "dropping unserializable error field");
                return self;
            },
        };
        if self.fields.iter().any(|(existing, _)| *existing == key) {
            tracing::debug!(field = %key, "error field already attached");
            return self;
        }
        self.fields.push((key, value));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    /// Tri-state retryability: `None` means unset.
    #[inline]
    pub fn retryable(&self) -> Option<bool> {
        self.retryable
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[inline]
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    #[inline]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Attached fields in attachment order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(existing, _)| existing == key).map(|(_, value)| value)
    }

    /// Renders the error with explicit formatting options.
    pub fn format_with(&self, options: &FormatOptions) -> String {
        stringify_error(self, options)
    }

    /// Exports every field as a JSON object.
    ///
    /// Attached fields come first, then `code`, `retryable`, `timestamp`
    /// (ISO-8601), `name`, `message` and `stack`. A structured cause is
    /// exported recursively; any other error cause is exported as its display
    /// text and a value cause as-is.
    pub fn to_json(&self) -> Value {
        let mut result = Map::new();

        for (key, value) in &self.fields {
            result.insert(key.clone(), value.clone());
        }

        if let Some(code) = &self.code {
            result.insert("code".into(), code_to_value(code));
        }
        if let Some(retryable) = self.retryable {
            result.insert("retryable".into(), Value::Bool(retryable));
        }
        result.insert(
            "timestamp".into(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        result.insert("name".into(), Value::String(self.name.to_string()));
        result.insert("message".into(), Value::String(self.message.clone()));
        result.insert("stack".into(), Value::String(self.backtrace.to_string()));

        if let Some(cause) = &self.cause {
            let exported = match cause {
                Cause::Value(value) => value.clone(),
                Cause::Error(error) => match error.downcast_ref::<StructuredError>() {
                    Some(structured) => structured.to_json(),
                    None => Value::String(error.to_string()),
                },
            };
            result.insert("cause".into(), exported);
        }

        Value::Object(result)
    }
}

fn code_to_value(code: &ErrorCode) -> Value {
    match code {
        ErrorCode::Number(number) => Value::from(*number),
        other => Value::String(other.to_string()),
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify_error(self, &FormatOptions::default()))
    }
}

impl Error for StructuredError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().and_then(Cause::as_error)
    }
}

impl Serialize for StructuredError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
