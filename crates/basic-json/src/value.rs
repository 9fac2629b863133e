//! The tagged JSON value.
//!
//! A [`Value`] holds exactly one of eight kinds. Scalars (`null`, booleans and
//! the three numeric kinds) live inline; strings, arrays and objects live in
//! storage obtained from the value's [`Allocator`] and are owned by exactly
//! one value. The representation is private: payloads are reached only through
//! the accessors in [`access`](crate::access), which check the kind first.
//!
//! Dropping a value tears its subtree down iteratively (see
//! [`destroy`](crate::destroy)). Cloning, formatting with `{:?}` and the JSON
//! bridge walk the tree with an explicit stack as well, so none of them uses
//! call stack in proportion to nesting depth.

use crate::alloc::{self, AllocError, Allocator, Global};
use crate::destroy;
use crate::error::{Context, Result, TypeError};
use crate::kind::Kind;
use crate::lifecycle::{self, Owned};
use crate::map::{self, Map};
use crate::string::JsonString;
use std::fmt;

/// Array payload: an ordered sequence of values in the strategy's storage.
pub type Array<A = Global> = allocator_api2::vec::Vec<Value<A>, A>;

/// Object payload: string keys mapped to values.
pub type Object<A = Global> = Map<Value<A>, A>;

/// A JSON value whose heap-held payloads are allocated through strategy `A`.
pub struct Value<A: Allocator = Global> {
    pub(crate) repr: Repr<A>,
}

pub(crate) enum Repr<A: Allocator> {
    Null,
    Boolean(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(Owned<JsonString<A>, A>),
    Array(Owned<Array<A>, A>),
    Object(Owned<Object<A>, A>),
}

impl<A: Allocator> Value<A> {
    pub const fn null() -> Self {
        Value { repr: Repr::Null }
    }

    /// Default-populated value of `kind`: an empty container for strings,
    /// arrays and objects, `false` / zero for scalars.
    pub fn try_with_kind_in(kind: Kind, alloc: &A) -> std::result::Result<Self, AllocError> {
        let repr = match kind {
            Kind::Null => Repr::Null,
            Kind::Boolean => Repr::Boolean(false),
            Kind::Integer => Repr::Integer(0),
            Kind::Unsigned => Repr::Unsigned(0),
            Kind::Float => Repr::Float(0.0),
            Kind::String => Repr::String(lifecycle::create(alloc, JsonString::new_in(alloc.clone()))?),
            Kind::Array => Repr::Array(lifecycle::create(alloc, Array::<A>::new_in(alloc.clone()))?),
            Kind::Object => Repr::Object(lifecycle::create(alloc, Object::<A>::new_in(alloc.clone()))?),
        };
        Ok(Value { repr })
    }

    /// String value whose node and bytes both come from `alloc`.
    pub fn try_string_in(text: impl AsRef<str>, alloc: &A) -> std::result::Result<Self, AllocError> {
        let text = text.as_ref();
        let owned = lifecycle::create_with(alloc, || JsonString::try_from_str_in(text, alloc.clone()))?;
        Ok(Value {
            repr: Repr::String(owned),
        })
    }

    /// Adopt `items` as the array payload. Pass a clone to keep the original.
    pub fn try_array_in(items: Array<A>, alloc: &A) -> std::result::Result<Self, AllocError> {
        let owned = lifecycle::create(alloc, items)?;
        Ok(Value {
            repr: Repr::Array(owned),
        })
    }

    /// Adopt `entries` as the object payload. Pass a clone to keep the original.
    pub fn try_object_in(entries: Object<A>, alloc: &A) -> std::result::Result<Self, AllocError> {
        let owned = lifecycle::create(alloc, entries)?;
        Ok(Value {
            repr: Repr::Object(owned),
        })
    }

    pub fn kind(&self) -> Kind {
        match &self.repr {
            Repr::Null => Kind::Null,
            Repr::Boolean(_) => Kind::Boolean,
            Repr::Integer(_) => Kind::Integer,
            Repr::Unsigned(_) => Kind::Unsigned,
            Repr::Float(_) => Kind::Float,
            Repr::String(_) => Kind::String,
            Repr::Array(_) => Kind::Array,
            Repr::Object(_) => Kind::Object,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.repr, Repr::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.repr, Repr::Boolean(_))
    }

    /// Signed integers only; see [`is_unsigned`](Self::is_unsigned).
    pub fn is_integer(&self) -> bool {
        matches!(self.repr, Repr::Integer(_))
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self.repr, Repr::Unsigned(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.repr, Repr::Float(_))
    }

    /// Any of the three numeric kinds.
    pub fn is_number(&self) -> bool {
        matches!(
            self.repr,
            Repr::Integer(_) | Repr::Unsigned(_) | Repr::Float(_)
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self.repr, Repr::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.repr, Repr::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.repr, Repr::Object(_))
    }

    /// Arrays and objects.
    pub fn is_structured(&self) -> bool {
        self.is_array() || self.is_object()
    }

    /// Everything that is not an array or an object.
    pub fn is_primitive(&self) -> bool {
        !self.is_structured()
    }

    /// Number of elements: entries for arrays and objects, `0` for null and
    /// `1` for every other kind.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Null => 0,
            Repr::Array(items) => items.len(),
            Repr::Object(entries) => entries.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strategy holding this value's payload; `None` for inline scalars.
    pub fn allocator(&self) -> Option<&A> {
        match &self.repr {
            Repr::String(text) => Some(text.allocator()),
            Repr::Array(items) => Some(items.allocator()),
            Repr::Object(entries) => Some(entries.allocator()),
            _ => None,
        }
    }

    /// Move the value out, leaving `null` behind.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Append to an array.
    pub fn push(&mut self, item: Self) -> Result<()> {
        match &mut self.repr {
            Repr::Array(items) => {
                alloc::reserve(&mut **items, 1)?;
                items.push(item);
                Ok(())
            }
            _ => Err(self.misuse(308, "push").into()),
        }
    }

    /// Insert into an object, returning the value previously stored under `key`.
    pub fn insert(&mut self, key: impl AsRef<str>, item: Self) -> Result<Option<Self>> {
        match &mut self.repr {
            Repr::Object(entries) => Ok(entries.try_insert(key.as_ref(), item)?),
            _ => Err(self.misuse(309, "insert").into()),
        }
    }

    /// Erase `key` from an object, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Result<Option<Self>> {
        match &mut self.repr {
            Repr::Object(entries) => Ok(entries.remove(key)),
            _ => Err(self.misuse(307, "remove").into()),
        }
    }

    fn misuse(&self, id: i32, operation: &str) -> TypeError {
        TypeError::new(
            id,
            format!("cannot use {operation}() with {}", self.type_name()),
            Context::of(self),
        )
    }

    /// Deep copy, allocating every copied payload through the strategy of its
    /// source. A refusal drops the partial copy and returns the error.
    pub fn try_clone(&self) -> std::result::Result<Self, AllocError> {
        let Some(children) = self.children() else {
            return self.shallow_copy();
        };

        let mut stack = vec![CloneFrame {
            key: None,
            children,
            copy: self.shallow_copy()?,
        }];
        let mut finished = None;
        while let Some(frame) = stack.last_mut() {
            match frame.children.next_child() {
                Some((key, child)) => match child.children() {
                    Some(grandchildren) => {
                        let copy = child.shallow_copy()?;
                        stack.push(CloneFrame {
                            key,
                            children: grandchildren,
                            copy,
                        });
                    }
                    None => frame.copy.attach(key, child.shallow_copy()?)?,
                },
                None => {
                    if let Some(done) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.copy.attach(done.key, done.copy)?,
                            None => finished = Some(done.copy),
                        }
                    }
                }
            }
        }
        Ok(finished.unwrap_or_default())
    }

    /// Copy of the payload without children: scalars and strings are copied
    /// whole, arrays and objects come back empty with room for every child.
    fn shallow_copy(&self) -> std::result::Result<Self, AllocError> {
        let repr = match &self.repr {
            Repr::Null => Repr::Null,
            Repr::Boolean(b) => Repr::Boolean(*b),
            Repr::Integer(n) => Repr::Integer(*n),
            Repr::Unsigned(n) => Repr::Unsigned(*n),
            Repr::Float(x) => Repr::Float(*x),
            Repr::String(text) => {
                let strategy = text.allocator();
                Repr::String(lifecycle::create_with(strategy, || {
                    JsonString::try_from_str_in(text, strategy.clone())
                })?)
            }
            Repr::Array(items) => {
                let strategy = items.allocator();
                Repr::Array(lifecycle::create_with(
                    strategy,
                    || -> std::result::Result<Array<A>, AllocError> {
                        let mut copy = Array::<A>::new_in(strategy.clone());
                        alloc::reserve(&mut copy, items.len())?;
                        Ok(copy)
                    },
                )?)
            }
            Repr::Object(entries) => {
                let strategy = entries.allocator();
                Repr::Object(lifecycle::create_with(strategy, || {
                    Object::<A>::try_with_capacity_in(entries.len(), strategy.clone())
                })?)
            }
        };
        Ok(Value { repr })
    }

    /// Add a finished child to a container under construction.
    ///
    /// Array children come unkeyed and object children keyed; the walkers in
    /// this crate never mix the two.
    pub(crate) fn attach(&mut self, key: Option<&str>, item: Self) -> std::result::Result<(), AllocError> {
        match (&mut self.repr, key) {
            (Repr::Array(items), None) => {
                alloc::reserve(&mut **items, 1)?;
                items.push(item);
            }
            (Repr::Object(entries), Some(key)) => {
                entries.try_insert(key, item)?;
            }
            (repr, key) => unreachable!(
                "cannot attach child with key {key:?} to {} container",
                kind_of(repr)
            ),
        }
        Ok(())
    }

    /// The children of an array or object; `None` for every other kind.
    pub(crate) fn children(&self) -> Option<Children<'_, A>> {
        match &self.repr {
            Repr::Array(items) => Some(Children::Array(items.iter())),
            Repr::Object(entries) => Some(Children::Object(entries.iter())),
            _ => None,
        }
    }

    /// Write everything up to the first child, pushing a frame for containers.
    fn write_debug_head<'a>(
        &'a self,
        f: &mut fmt::Formatter<'_>,
        stack: &mut Vec<(Children<'a, A>, bool)>,
    ) -> fmt::Result {
        match &self.repr {
            Repr::Null => f.write_str("Null"),
            Repr::Boolean(b) => write!(f, "Boolean({b:?})"),
            Repr::Integer(n) => write!(f, "Integer({n:?})"),
            Repr::Unsigned(n) => write!(f, "Unsigned({n:?})"),
            Repr::Float(x) => write!(f, "Float({x:?})"),
            Repr::String(text) => write!(f, "String({:?})", text.as_str()),
            Repr::Array(items) => {
                f.write_str("Array [")?;
                stack.push((Children::Array(items.iter()), true));
                Ok(())
            }
            Repr::Object(entries) => {
                f.write_str("Object {")?;
                stack.push((Children::Object(entries.iter()), true));
                Ok(())
            }
        }
    }
}

fn kind_of<A: Allocator>(repr: &Repr<A>) -> &'static str {
    match repr {
        Repr::Array(_) => "array",
        Repr::Object(_) => "object",
        _ => "scalar",
    }
}

/// Cursor over the children of one array or object.
pub(crate) enum Children<'a, A: Allocator> {
    Array(std::slice::Iter<'a, Value<A>>),
    Object(map::Iter<'a, Value<A>, A>),
}

impl<'a, A: Allocator> Children<'a, A> {
    /// Next child, with its key when walking an object.
    pub(crate) fn next_child(&mut self) -> Option<(Option<&'a str>, &'a Value<A>)> {
        match self {
            Children::Array(items) => items.next().map(|item| (None, item)),
            Children::Object(entries) => entries.next().map(|(key, item)| (Some(key), item)),
        }
    }

    fn closer(&self) -> &'static str {
        match self {
            Children::Array(_) => "]",
            Children::Object(_) => "}",
        }
    }
}

/// One array or object being copied by [`Value::try_clone`].
struct CloneFrame<'a, A: Allocator> {
    /// Key under which the finished copy goes into the parent object.
    key: Option<&'a str>,
    children: Children<'a, A>,
    copy: Value<A>,
}

impl<A: Allocator + Default> Value<A> {
    /// Default-populated value of `kind` using a fresh `A`.
    ///
    /// Panics if the strategy refuses storage; use
    /// [`try_with_kind_in`](Self::try_with_kind_in) to handle that.
    pub fn with_kind(kind: Kind) -> Self {
        Self::try_with_kind_in(kind, &A::default()).unwrap_or_else(|err| lifecycle::alloc_failed(err))
    }

    pub fn array() -> Self {
        Self::with_kind(Kind::Array)
    }

    pub fn object() -> Self {
        Self::with_kind(Kind::Object)
    }
}

impl<A: Allocator> Default for Value<A> {
    fn default() -> Self {
        Value::null()
    }
}

impl<A: Allocator> Drop for Value<A> {
    fn drop(&mut self) {
        destroy::release_descendants(self);
    }
}

impl<A: Allocator> Clone for Value<A> {
    /// Panics if the strategy refuses storage; see [`Value::try_clone`].
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|err| lifecycle::alloc_failed(err))
    }
}

impl<A: Allocator> fmt::Debug for Value<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = Vec::new();
        self.write_debug_head(f, &mut stack)?;
        while let Some((children, first)) = stack.last_mut() {
            match children.next_child() {
                Some((key, child)) => {
                    if !std::mem::replace(first, false) {
                        f.write_str(", ")?;
                    }
                    if let Some(key) = key {
                        write!(f, "{key:?}: ")?;
                    }
                    child.write_debug_head(f, &mut stack)?;
                }
                None => {
                    f.write_str(children.closer())?;
                    stack.pop();
                }
            }
        }
        Ok(())
    }
}

macro_rules! from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<A: Allocator> From<$ty> for Value<A> {
                fn from(value: $ty) -> Self {
                    Value { repr: Repr::$variant(value.into()) }
                }
            }
        )*
    };
}

from_scalar! {
    bool => Boolean,
    i8 => Integer,
    i16 => Integer,
    i32 => Integer,
    i64 => Integer,
    u8 => Unsigned,
    u16 => Unsigned,
    u32 => Unsigned,
    u64 => Unsigned,
    f32 => Float,
    f64 => Float,
}

impl<A: Allocator> From<()> for Value<A> {
    fn from((): ()) -> Self {
        Value::null()
    }
}

impl<A: Allocator + Default> From<Kind> for Value<A> {
    fn from(kind: Kind) -> Self {
        Value::with_kind(kind)
    }
}

impl<A: Allocator + Default> From<String> for Value<A> {
    fn from(text: String) -> Self {
        Value::from(text.as_str())
    }
}

impl<A: Allocator + Default> From<&str> for Value<A> {
    fn from(text: &str) -> Self {
        Value::try_string_in(text, &A::default()).unwrap_or_else(|err| lifecycle::alloc_failed(err))
    }
}

/// The string's own strategy also holds the new node.
impl<A: Allocator> From<JsonString<A>> for Value<A> {
    fn from(text: JsonString<A>) -> Self {
        let strategy = text.allocator().clone();
        match lifecycle::create(&strategy, text) {
            Ok(owned) => Value {
                repr: Repr::String(owned),
            },
            Err(err) => lifecycle::alloc_failed(err),
        }
    }
}

/// The array's own strategy also holds the new node.
impl<A: Allocator> From<Array<A>> for Value<A> {
    fn from(items: Array<A>) -> Self {
        let strategy = items.allocator().clone();
        Value::try_array_in(items, &strategy).unwrap_or_else(|err| lifecycle::alloc_failed(err))
    }
}

impl<A: Allocator> From<&Array<A>> for Value<A> {
    fn from(items: &Array<A>) -> Self {
        Value::from(items.clone())
    }
}

/// The object's own strategy also holds the new node.
impl<A: Allocator> From<Object<A>> for Value<A> {
    fn from(entries: Object<A>) -> Self {
        let strategy = entries.allocator().clone();
        Value::try_object_in(entries, &strategy).unwrap_or_else(|err| lifecycle::alloc_failed(err))
    }
}

impl<A: Allocator> From<&Object<A>> for Value<A> {
    fn from(entries: &Object<A>) -> Self {
        Value::from(entries.clone())
    }
}

impl<A: Allocator + Default> FromIterator<Value<A>> for Value<A> {
    fn from_iter<I: IntoIterator<Item = Value<A>>>(iter: I) -> Self {
        let mut items = Array::<A>::new_in(A::default());
        items.extend(iter);
        Value::from(items)
    }
}

impl<A: Allocator + Default, K: AsRef<str>> FromIterator<(K, Value<A>)> for Value<A> {
    fn from_iter<I: IntoIterator<Item = (K, Value<A>)>>(iter: I) -> Self {
        let mut entries = Object::<A>::new_in(A::default());
        for (key, item) in iter {
            entries.insert(key.as_ref(), item);
        }
        Value::from(entries)
    }
}
