//! Conversion to and from `serde_json::Value`.
//!
//! An in-memory bridge, not a parser or serializer: it moves already-parsed
//! documents into the value model and back. Both directions walk the tree with
//! an explicit stack, so nesting depth is bounded by memory only. Note that
//! dropping a very deep `serde_json::Value` recurses inside `serde_json`
//! itself.
//!
//! Number mapping: integers that fit `i64` become `integer`, larger positive
//! integers become `unsigned`, everything else `float`. Non-finite floats have
//! no JSON form and come back as `null`.

use crate::alloc::{self, AllocError, Allocator};
use crate::lifecycle;
use crate::value::{Array, Children, Object, Repr, Value};
use serde_json::Number;

/// Unconsumed children of a `serde_json` container being imported.
enum Pending {
    Array(std::vec::IntoIter<serde_json::Value>),
    Object(serde_json::map::IntoIter),
}

impl Pending {
    fn next_entry(&mut self) -> Option<(Option<String>, serde_json::Value)> {
        match self {
            Pending::Array(items) => items.next().map(|item| (None, item)),
            Pending::Object(entries) => entries.next().map(|(key, item)| (Some(key), item)),
        }
    }
}

struct ImportFrame<A: Allocator> {
    key: Option<String>,
    pending: Pending,
    built: Value<A>,
}

enum Opened<A: Allocator> {
    Leaf(Value<A>),
    Container(Pending, Value<A>),
}

/// Convert a scalar or string outright; start an empty container otherwise.
fn open<A: Allocator>(json: serde_json::Value, alloc: &A) -> Result<Opened<A>, AllocError> {
    let opened = match json {
        serde_json::Value::Null => Opened::Leaf(Value::null()),
        serde_json::Value::Bool(b) => Opened::Leaf(Value::from(b)),
        serde_json::Value::Number(n) => Opened::Leaf(from_number(&n)),
        serde_json::Value::String(s) => Opened::Leaf(Value::try_string_in(s, alloc)?),
        serde_json::Value::Array(items) => {
            let mut array = Array::<A>::new_in(alloc.clone());
            alloc::reserve(&mut array, items.len())?;
            let built = Value::try_array_in(array, alloc)?;
            Opened::Container(Pending::Array(items.into_iter()), built)
        }
        serde_json::Value::Object(entries) => {
            let object = Object::<A>::try_with_capacity_in(entries.len(), alloc.clone())?;
            let built = Value::try_object_in(object, alloc)?;
            Opened::Container(Pending::Object(entries.into_iter()), built)
        }
    };
    Ok(opened)
}

struct ExportFrame<'a, A: Allocator> {
    key: Option<&'a str>,
    children: Children<'a, A>,
    out: serde_json::Value,
}

/// Scalars and strings in full; arrays and objects as empty containers.
fn head_json<A: Allocator>(value: &Value<A>) -> serde_json::Value {
    match &value.repr {
        Repr::Null => serde_json::Value::Null,
        Repr::Boolean(b) => serde_json::Value::Bool(*b),
        Repr::Integer(n) => serde_json::Value::Number(Number::from(*n)),
        Repr::Unsigned(n) => serde_json::Value::Number(Number::from(*n)),
        Repr::Float(x) => Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Repr::String(text) => serde_json::Value::String(text.as_str().to_owned()),
        Repr::Array(items) => serde_json::Value::Array(Vec::with_capacity(items.len())),
        Repr::Object(_) => serde_json::Value::Object(serde_json::Map::new()),
    }
}

fn put(out: &mut serde_json::Value, key: Option<&str>, item: serde_json::Value) {
    match (out, key) {
        (serde_json::Value::Array(items), None) => items.push(item),
        (serde_json::Value::Object(entries), Some(key)) => {
            entries.insert(key.to_owned(), item);
        }
        (_, key) => unreachable!("child with key {key:?} does not fit its container"),
    }
}

impl<A: Allocator> Value<A> {
    /// Build a value from `json`, obtaining every payload from `alloc`.
    ///
    /// On refusal the partially built tree is released and `json` is gone.
    pub fn try_from_json_in(json: serde_json::Value, alloc: &A) -> Result<Self, AllocError> {
        let mut stack = match open(json, alloc)? {
            Opened::Leaf(value) => return Ok(value),
            Opened::Container(pending, built) => vec![ImportFrame {
                key: None,
                pending,
                built,
            }],
        };

        let mut finished = None;
        while let Some(frame) = stack.last_mut() {
            match frame.pending.next_entry() {
                Some((key, child)) => match open(child, alloc)? {
                    Opened::Leaf(value) => frame.built.attach(key.as_deref(), value)?,
                    Opened::Container(pending, built) => stack.push(ImportFrame { key, pending, built }),
                },
                None => {
                    if let Some(done) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.built.attach(done.key.as_deref(), done.built)?,
                            None => finished = Some(done.built),
                        }
                    }
                }
            }
        }
        Ok(finished.unwrap_or_default())
    }

    pub fn to_json(&self) -> serde_json::Value {
        let Some(children) = self.children() else {
            return head_json(self);
        };

        let mut stack = vec![ExportFrame {
            key: None,
            children,
            out: head_json(self),
        }];
        let mut finished = serde_json::Value::Null;
        while let Some(frame) = stack.last_mut() {
            match frame.children.next_child() {
                Some((key, child)) => match child.children() {
                    Some(grandchildren) => stack.push(ExportFrame {
                        key,
                        children: grandchildren,
                        out: head_json(child),
                    }),
                    None => put(&mut frame.out, key, head_json(child)),
                },
                None => {
                    if let Some(done) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => put(&mut parent.out, done.key, done.out),
                            None => finished = done.out,
                        }
                    }
                }
            }
        }
        finished
    }
}

impl<A: Allocator + Default> Value<A> {
    /// Build a value from `json` with a fresh `A`.
    ///
    /// Panics if the strategy refuses storage; see
    /// [`try_from_json_in`](Value::try_from_json_in).
    pub fn from_json(json: serde_json::Value) -> Self {
        Value::try_from_json_in(json, &A::default()).unwrap_or_else(|err| lifecycle::alloc_failed(err))
    }
}

impl<A: Allocator + Default> From<serde_json::Value> for Value<A> {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl<A: Allocator> From<&Value<A>> for serde_json::Value {
    fn from(value: &Value<A>) -> Self {
        value.to_json()
    }
}

fn from_number<A: Allocator>(n: &Number) -> Value<A> {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        Value::from(n.as_f64().unwrap_or(f64::NAN))
    }
}
