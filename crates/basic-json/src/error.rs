//! Error hierarchy for value access and construction.
//!
//! Every JSON error is an immutable [`Exception`] carrying a numeric id, a
//! [`Category`], a message, and an optional diagnostic derived from a
//! [`Context`]. The rendered form is
//!
//! ```text
//! [json.exception.<category>.<id>] [diagnostic:<diagnostic>.] <message>
//! ```
//!
//! with the diagnostic clause left out when the context yields nothing.

use crate::alloc::{AllocError, Allocator};
use crate::kind::Kind;
use crate::value::Value;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// Error category, rendered into the `json.exception.<category>` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Type,
    InvalidIterator,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Type => "type_error",
            Category::InvalidIterator => "invalid_iterator",
        }
    }

    /// Each category describes the same context differently: type errors talk
    /// about the offending value, iterator errors about what was being walked.
    fn diagnose(self, context: &Context<'_>) -> Option<String> {
        let text = match (self, context) {
            (_, Context::None) => return None,
            (Category::Type, Context::Value { kind, len }) if kind.is_structured() => {
                format!("{kind} value with {len} entries")
            }
            (Category::Type, Context::Value { kind, .. }) => format!("{kind} value"),
            (Category::InvalidIterator, Context::Value { kind, len }) if kind.is_structured() => {
                format!("{kind} with {len} entries")
            }
            (Category::InvalidIterator, Context::Value { kind, .. }) => {
                format!("{kind} is not iterable")
            }
            (_, Context::Error(cause)) => {
                format!("raised after {}.{}", cause.category().name(), cause.id())
            }
        };
        Some(text)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an error was raised about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context<'a> {
    /// Nothing to diagnose.
    None,
    /// A single value, summarized by kind and [`Value::len`].
    Value { kind: Kind, len: usize },
    /// Another error that led to this one.
    Error(&'a Exception),
}

impl Context<'_> {
    pub fn of<A: Allocator>(value: &Value<A>) -> Self {
        Context::Value {
            kind: value.kind(),
            len: value.len(),
        }
    }
}

impl<'a, A: Allocator> From<&'a Value<A>> for Context<'a> {
    fn from(value: &'a Value<A>) -> Self {
        Context::of(value)
    }
}

impl<'a> From<&'a Exception> for Context<'a> {
    fn from(cause: &'a Exception) -> Self {
        Context::Error(cause)
    }
}

/// Shared body of every categorized error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    id: i32,
    category: Category,
    message: String,
    diagnostic: Option<String>,
    what: String,
}

impl Exception {
    pub fn new(category: Category, id: i32, message: impl Into<String>, context: Context<'_>) -> Self {
        let message = message.into();
        let diagnostic = category.diagnose(&context).filter(|d| !d.is_empty());

        let mut what = format!("[json.exception.{}.{}] ", category.name(), id);
        if let Some(diagnostic) = &diagnostic {
            what.push_str(&format!("[diagnostic:{diagnostic}.] "));
        }
        what.push_str(&message);

        Self {
            id,
            category,
            message,
            diagnostic,
            what,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The message without prefix or diagnostic.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// The fully rendered message, ready to log or display verbatim.
    pub fn what(&self) -> &str {
        &self.what
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.what)
    }
}

impl std::error::Error for Exception {}

/// A value was accessed or mutated as a kind it does not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TypeError(Exception);

impl TypeError {
    pub fn new(id: i32, message: impl Into<String>, context: Context<'_>) -> Self {
        Self(Exception::new(Category::Type, id, message, context))
    }
}

impl Deref for TypeError {
    type Target = Exception;

    fn deref(&self) -> &Exception {
        &self.0
    }
}

/// An iterator was used in a state it does not support.
///
/// Nothing in the value model raises this; traversal code built on top of it
/// reports through this category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InvalidIteratorError(Exception);

impl InvalidIteratorError {
    pub fn new(id: i32, message: impl Into<String>, context: Context<'_>) -> Self {
        Self(Exception::new(Category::InvalidIterator, id, message, context))
    }
}

impl Deref for InvalidIteratorError {
    type Target = Exception;

    fn deref(&self) -> &Exception {
        &self.0
    }
}

/// Errors that can occur while building, mutating or reading a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    InvalidIterator(#[from] InvalidIteratorError),

    /// The allocation strategy refused storage for a payload.
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

impl JsonError {
    /// The categorized body, absent for allocation failures.
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            JsonError::Type(err) => Some(&**err),
            JsonError::InvalidIterator(err) => Some(&**err),
            JsonError::Alloc(_) => None,
        }
    }
}

/// Convenience alias used throughout basic-json.
pub type Result<T> = std::result::Result<T, JsonError>;
