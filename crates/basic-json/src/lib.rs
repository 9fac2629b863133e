//! # basic-json
//!
//! In-memory value model for JSON documents: one tagged [`Value`] that holds
//! null, a boolean, a signed or unsigned integer, a float, a string, an array,
//! or an object.
//!
//! Strings, arrays and objects live in storage supplied by a pluggable
//! [`Allocator`] strategy (system heap, budgeted ledger or bump arena) and are
//! exclusively owned by their value. Dropping a value tears its
//! subtree down with an explicit worklist, so arbitrarily deep documents never
//! overflow the call stack. Payloads are reached only through accessors that
//! check the stored kind first.
//!
//! ## Quick start
//!
//! ```rust
//! use basic_json::{Array, Object, Value};
//!
//! let mut scores: Value = Value::array();
//! for score in [95_i64, 87, 92] {
//!     scores.push(Value::from(score)).unwrap();
//! }
//!
//! let mut doc: Value = Value::object();
//! doc.insert("name", Value::from("Alice")).unwrap();
//! doc.insert("scores", scores).unwrap();
//!
//! let fields = doc.get_ptr::<Object>().unwrap();
//! assert_eq!(fields["scores"].get_ptr::<Array>().map(|items| items.len()), Some(3));
//! assert!(fields["name"].get_ptr::<bool>().is_none());
//!
//! // Strict retrieval reports the stored kind on mismatch.
//! let err = fields["name"].get::<bool>().unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "[json.exception.type_error.302] [diagnostic:string value.] type must be boolean, but is string"
//! );
//! ```
//!
//! ## Modules
//!
//! - [`value`]: the `Value` union, kind predicates, construction and mutation
//! - [`access`]: kind-checked payload accessors
//! - [`destroy`]: stack-safe teardown of nested trees
//! - [`lifecycle`]: owning handles in storage from an allocation strategy
//! - [`alloc`]: allocation strategies (`Global`, `Tracked`, `Arena`)
//! - [`error`]: categorized errors (`type_error`, `invalid_iterator`)
//! - [`kind`]: the `Kind` enumerator
//! - [`map`]: object container backend
//! - [`string`]: strategy-allocated string payload
//! - [`json`]: bridge to `serde_json::Value`

pub mod access;
pub mod alloc;
pub mod destroy;
pub mod error;
pub mod json;
pub mod kind;
pub mod lifecycle;
pub mod map;
pub mod string;
pub mod value;

pub use access::{Payload, PayloadMut};
pub use alloc::{AllocError, AllocStats, Allocator, Arena, Global, Tracked};
pub use error::{Category, Context, Exception, InvalidIteratorError, JsonError, Result, TypeError};
pub use kind::Kind;
pub use lifecycle::Owned;
pub use map::Map;
pub use string::JsonString;
pub use value::{Array, Object, Value};
