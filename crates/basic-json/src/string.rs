//! UTF-8 string payload whose bytes live in a strategy's storage.

use crate::alloc::{self, AllocError, Allocator, Global};
use allocator_api2::vec::Vec;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

/// Growable UTF-8 string allocated through `A`.
///
/// Derefs to `str`, so the usual read-only string API applies.
#[derive(Clone)]
pub struct JsonString<A: Allocator = Global> {
    // Always valid UTF-8.
    bytes: Vec<u8, A>,
}

impl JsonString<Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<A: Allocator> JsonString<A> {
    /// Empty string; allocates nothing until written to.
    pub fn new_in(alloc: A) -> Self {
        Self {
            bytes: Vec::new_in(alloc),
        }
    }

    /// Copy `text` into storage obtained from `alloc`.
    pub fn try_from_str_in(text: &str, alloc: A) -> Result<Self, AllocError> {
        let mut string = Self::new_in(alloc);
        string.try_push_str(text)?;
        Ok(string)
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: `bytes` only ever receives whole `str`s.
        unsafe { std::str::from_utf8_unchecked(&self.bytes) }
    }

    pub fn as_mut_str(&mut self) -> &mut str {
        // SAFETY: as above; `&mut str` cannot break UTF-8 validity.
        unsafe { std::str::from_utf8_unchecked_mut(&mut self.bytes) }
    }

    /// Append `text`, reporting refusal instead of aborting.
    pub fn try_push_str(&mut self, text: &str) -> Result<(), AllocError> {
        alloc::reserve(&mut self.bytes, text.len())?;
        self.bytes.extend_from_slice(text.as_bytes());
        Ok(())
    }

    pub fn push_str(&mut self, text: &str) {
        self.bytes.extend_from_slice(text.as_bytes());
    }

    pub fn push(&mut self, ch: char) {
        self.push_str(ch.encode_utf8(&mut [0; 4]));
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn allocator(&self) -> &A {
        self.bytes.allocator()
    }
}

impl Default for JsonString<Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Allocator> Deref for JsonString<A> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<A: Allocator> DerefMut for JsonString<A> {
    fn deref_mut(&mut self) -> &mut str {
        self.as_mut_str()
    }
}

impl<A: Allocator> AsRef<str> for JsonString<A> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<A: Allocator> Borrow<str> for JsonString<A> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<A: Allocator> fmt::Debug for JsonString<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<A: Allocator> fmt::Display for JsonString<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<A: Allocator> fmt::Write for JsonString<A> {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        self.try_push_str(text).map_err(|_| fmt::Error)
    }
}

impl<A: Allocator, B: Allocator> PartialEq<JsonString<B>> for JsonString<A> {
    fn eq(&self, other: &JsonString<B>) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<A: Allocator> Eq for JsonString<A> {}

impl<A: Allocator> PartialEq<str> for JsonString<A> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<A: Allocator> PartialEq<&str> for JsonString<A> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<A: Allocator> PartialEq<JsonString<A>> for &str {
    fn eq(&self, other: &JsonString<A>) -> bool {
        *self == other.as_str()
    }
}

impl<A: Allocator> Hash for JsonString<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<&str> for JsonString<Global> {
    fn from(text: &str) -> Self {
        let mut string = Self::new();
        string.push_str(text);
        string
    }
}

impl From<String> for JsonString<Global> {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}
