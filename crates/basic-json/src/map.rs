//! Backing container for object payloads.
//!
//! Entries are kept in one contiguous buffer obtained from the value's
//! strategy, keys included. By default the buffer is sorted by key and lookups
//! binary-search it. With the `preserve_order` feature the entries keep
//! insertion order instead and lookups scan linearly. Removal keeps the
//! relative order of the remaining entries either way.

use crate::alloc::{self, AllocError, Allocator, Global};
use crate::lifecycle;
use crate::string::JsonString;
use allocator_api2::vec::Vec;
use std::fmt;
use std::ops::Index;

/// String-keyed map allocated through `A`.
#[derive(Clone)]
pub struct Map<V, A: Allocator = Global> {
    entries: Vec<(JsonString<A>, V), A>,
}

impl<V> Map<V, Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<V, A: Allocator> Map<V, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            entries: Vec::new_in(alloc),
        }
    }

    /// Empty map with room for `capacity` entries.
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, AllocError> {
        let mut map = Self::new_in(alloc);
        alloc::reserve(&mut map.entries, capacity)?;
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn allocator(&self) -> &A {
        self.entries.allocator()
    }

    /// `Ok(index)` of `key`, or `Err(index)` where it would be inserted.
    #[cfg(not(feature = "preserve_order"))]
    fn find(&self, key: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(entry_key, _)| entry_key.as_str().cmp(key))
    }

    #[cfg(feature = "preserve_order")]
    fn find(&self, key: &str) -> Result<usize, usize> {
        self.entries
            .iter()
            .position(|(entry_key, _)| entry_key.as_str() == key)
            .ok_or(self.entries.len())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_ok()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let index = self.find(key).ok()?;
        Some(&self.entries[index].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let index = self.find(key).ok()?;
        Some(&mut self.entries[index].1)
    }

    /// Insert `value` under `key`, returning the value it replaced.
    ///
    /// Replacing allocates nothing; a new key needs room for one entry plus a
    /// copy of the key. On refusal `value` is dropped and the map is unchanged.
    pub fn try_insert(&mut self, key: &str, value: V) -> Result<Option<V>, AllocError> {
        match self.find(key) {
            Ok(index) => Ok(Some(std::mem::replace(&mut self.entries[index].1, value))),
            Err(index) => {
                let key = JsonString::try_from_str_in(key, self.allocator().clone())?;
                alloc::reserve(&mut self.entries, 1)?;
                self.entries.insert(index, (key, value));
                Ok(None)
            }
        }
    }

    /// Like [`try_insert`](Self::try_insert), treating refusal as fatal.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        self.try_insert(key, value)
            .unwrap_or_else(|err| lifecycle::alloc_failed(err))
    }

    /// Remove `key`, keeping the relative order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let index = self.find(key).ok()?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> Iter<'_, V, A> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, V, A> {
        IterMut {
            inner: self.entries.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Move every value into `out`, leaving the map empty.
    pub(crate) fn drain_values(&mut self, out: &mut std::vec::Vec<V>) {
        out.reserve(self.entries.len());
        out.extend(self.entries.drain(..).map(|(_, value)| value));
    }
}

impl<V, A: Allocator + Default> Default for Map<V, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<V, A: Allocator> Index<&str> for Map<V, A> {
    type Output = V;

    fn index(&self, key: &str) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry found for key {key:?}"),
        }
    }
}

impl<V: fmt::Debug, A: Allocator> fmt::Debug for Map<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: AsRef<str>, V> FromIterator<(K, V)> for Map<V, Global> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key.as_ref(), value);
        }
        map
    }
}

impl<'a, V, A: Allocator> IntoIterator for &'a Map<V, A> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over `(key, value)` pairs in map order.
pub struct Iter<'a, V, A: Allocator> {
    inner: std::slice::Iter<'a, (JsonString<A>, V)>,
}

impl<'a, V, A: Allocator> Iterator for Iter<'a, V, A> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V, A: Allocator> ExactSizeIterator for Iter<'_, V, A> {}

impl<V, A: Allocator> Default for Iter<'_, V, A> {
    fn default() -> Self {
        Self {
            inner: Default::default(),
        }
    }
}

/// Iterator over `(key, &mut value)` pairs in map order.
pub struct IterMut<'a, V, A: Allocator> {
    inner: std::slice::IterMut<'a, (JsonString<A>, V)>,
}

impl<'a, V, A: Allocator> Iterator for IterMut<'a, V, A> {
    type Item = (&'a str, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
