//! Reasons: the annotated facts attached to an outcome.
//!
//! A [`Reason`] is a message plus an ordered bag of [`TagValue`] tags. It comes
//! in two kinds: [`Success`] annotates a successful outcome, [`Error`] explains
//! a failed one. All three are immutable values; the `with_*` builders consume
//! the reason and hand back an updated copy.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::UsageError;

/// Ordered tag map. Insertion order is kept for display, lookup is by key.
pub type Tags = IndexMap<String, TagValue>;

/// Tag key set on errors built from a panic or a foreign error.
pub const EXCEPTION_TAG: &str = "exception";

// ============================================================================
// Tag Values
// ============================================================================

/// A scalar tag value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// No value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer that does not fit `i64`.
    UInt(u64),
    /// A finite floating point number.
    ///
    /// JSON has no encoding for NaN or infinities, so a non-finite `Float`
    /// serializes as `null`. The `From` conversions store those as `Text`.
    Float(f64),
    /// Text.
    Text(String),
}

impl TagValue {
    /// Returns the text if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `i64` when it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

macro_rules! tag_value_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for TagValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(<$conv>::from(value))
                }
            }
        )*
    };
}

tag_value_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    String => Text as String,
    &str => Text as String,
}

impl From<u64> for TagValue {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Self::Int)
            .unwrap_or(Self::UInt(value))
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Float(value)
        } else {
            Self::Text(value.to_string())
        }
    }
}

impl From<f32> for TagValue {
    fn from(value: f32) -> Self {
        Self::from(f64::from(value))
    }
}

impl From<usize> for TagValue {
    fn from(value: usize) -> Self {
        Self::from(value as u64)
    }
}

impl<T: Into<TagValue>> From<Option<T>> for TagValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// Reason
// ============================================================================

/// Base fact attached to an outcome: a message and its tags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reason {
    message: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    tags: Tags,
}

impl Reason {
    /// Create a reason with the given message and no tags.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tags: Tags::new(),
        }
    }

    fn insert_tag(mut self, key: String, value: TagValue) -> Self {
        self.tags.insert(key, value);
        self
    }

    fn replace_message(mut self, message: String) -> Self {
        self.message = message;
        self
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if self.tags.is_empty() {
            return Ok(());
        }
        if !self.message.is_empty() {
            f.write_str(" ")?;
        }
        f.write_str("{")?;
        for (i, (key, value)) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

/// Shared read and `with_*` surface of [`Reason`], [`Success`] and [`Error`].
pub trait ReasonLike: Sized {
    /// The underlying reason.
    fn reason(&self) -> &Reason;

    /// Rebuild `self` around a transformed reason.
    fn map_reason(self, f: impl FnOnce(Reason) -> Reason) -> Self;

    /// The message.
    fn message(&self) -> &str {
        &self.reason().message
    }

    /// All tags in insertion order.
    fn tags(&self) -> &Tags {
        &self.reason().tags
    }

    /// Look up a tag by key.
    fn tag(&self, key: &str) -> Option<&TagValue> {
        self.reason().tags.get(key)
    }

    /// Returns `true` if a tag with this key is present.
    fn has_tag(&self, key: &str) -> bool {
        self.reason().tags.contains_key(key)
    }

    /// Return a copy with the tag set, overwriting an existing key in place.
    ///
    /// # Panics
    ///
    /// Panics if `key` is empty. Use [`try_with_tag`](Self::try_with_tag) to
    /// get the error instead.
    fn with_tag(self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        match self.try_with_tag(key, value) {
            Ok(updated) => updated,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible form of [`with_tag`](Self::with_tag).
    fn try_with_tag(
        self,
        key: impl Into<String>,
        value: impl Into<TagValue>,
    ) -> Result<Self, UsageError> {
        let key = key.into();
        if key.is_empty() {
            return Err(UsageError::argument("key", "tag key must not be empty"));
        }
        let value = value.into();
        Ok(self.map_reason(|r| r.insert_tag(key, value)))
    }

    /// Return a copy with every tag from `tags` set, in iteration order.
    ///
    /// # Panics
    ///
    /// Panics if any key is empty.
    fn with_tags<K, V, I>(self, tags: I) -> Self
    where
        K: Into<String>,
        V: Into<TagValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        tags.into_iter()
            .fold(self, |acc, (key, value)| acc.with_tag(key, value))
    }

    /// Return a copy with the message replaced.
    fn with_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.map_reason(|r| r.replace_message(message))
    }
}

impl ReasonLike for Reason {
    fn reason(&self) -> &Reason {
        self
    }

    fn map_reason(self, f: impl FnOnce(Reason) -> Reason) -> Self {
        f(self)
    }
}

// ============================================================================
// Success
// ============================================================================

/// A non-fatal, informational annotation on an outcome.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Success(Reason);

impl Success {
    /// Create a success reason with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(Reason::new(message))
    }
}

impl ReasonLike for Success {
    fn reason(&self) -> &Reason {
        &self.0
    }

    fn map_reason(self, f: impl FnOnce(Reason) -> Reason) -> Self {
        Self(f(self.0))
    }
}

impl fmt::Display for Success {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Reason> for Success {
    fn from(reason: Reason) -> Self {
        Self(reason)
    }
}

impl From<&str> for Success {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Success {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

// ============================================================================
// Error
// ============================================================================

/// Semantic classification of an [`Error`].
///
/// The core never interprets the kind beyond [`ErrorKind::Cancelled`];
/// boundary layers use it (or tags) to pick transport-specific responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unclassified domain failure.
    #[default]
    Failure,
    /// Input did not pass validation.
    Validation,
    /// The requested entity does not exist.
    NotFound,
    /// The operation conflicts with current state.
    Conflict,
    /// The caller is not authenticated.
    Unauthorized,
    /// The caller is not allowed to perform the operation.
    Forbidden,
    /// A dependency is temporarily unavailable.
    Unavailable,
    /// A continuation panicked or a foreign error was captured.
    Unexpected,
    /// An asynchronous step was cancelled.
    Cancelled,
    /// Consumer-defined numeric classification.
    Custom(u16),
}

impl ErrorKind {
    /// Stable lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failure => "failure",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Unavailable => "unavailable",
            Self::Unexpected => "unexpected",
            Self::Cancelled => "cancelled",
            Self::Custom(_) => "custom",
        }
    }
}

/// A reason explaining why an outcome failed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Error {
    #[serde(flatten)]
    reason: Reason,
    #[serde(default)]
    kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    causes: Vec<Error>,
}

impl Error {
    /// Create an unclassified error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            reason: Reason::new(message),
            kind: ErrorKind::Failure,
            causes: Vec::new(),
        }
    }

    /// Create an error of the given kind.
    pub fn of_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(message).with_kind(kind)
    }

    /// Validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Validation, message)
    }

    /// Missing entity.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::NotFound, message)
    }

    /// State conflict.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Conflict, message)
    }

    /// Missing authentication.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Unauthorized, message)
    }

    /// Missing permission.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Forbidden, message)
    }

    /// Temporarily unavailable dependency.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Unavailable, message)
    }

    /// Unexpected fault, tagged as an exception.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Unexpected, message).with_tag(EXCEPTION_TAG, true)
    }

    /// The error produced when an asynchronous step is cancelled.
    pub fn cancelled() -> Self {
        Self::of_kind(ErrorKind::Cancelled, "operation was cancelled")
    }

    /// Build an error from a panic payload as returned by `catch_unwind`.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with a non-string payload".to_owned()
        };
        Self::unexpected(message)
    }

    /// Capture a foreign error, turning its `source()` chain into causes.
    pub fn from_std(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut error = Self::unexpected(err.to_string());
        if let Some(source) = err.source() {
            error.causes.push(Self::from_std(source));
        }
        error
    }

    /// Return a copy with the kind replaced.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Return a copy with `cause` appended to the causes.
    pub fn with_cause(mut self, cause: impl Into<Error>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// The classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Nested root causes, in the order they were attached.
    pub fn causes(&self) -> &[Error] {
        &self.causes
    }

    /// Returns `true` if this error records a cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

impl ReasonLike for Error {
    fn reason(&self) -> &Reason {
        &self.reason
    }

    fn map_reason(mut self, f: impl FnOnce(Reason) -> Reason) -> Self {
        self.reason = f(self.reason);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.reason.fmt(f)?;
        if self.causes.is_empty() {
            return Ok(());
        }
        f.write_str(" (caused by: ")?;
        for (i, cause) in self.causes.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            cause.fmt(f)?;
        }
        f.write_str(")")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.causes
            .first()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl From<Reason> for Error {
    fn from(reason: Reason) -> Self {
        Self {
            reason,
            kind: ErrorKind::Failure,
            causes: Vec::new(),
        }
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<UsageError> for Error {
    fn from(err: UsageError) -> Self {
        Self::from_std(&err)
    }
}
