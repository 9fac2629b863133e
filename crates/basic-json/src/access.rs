//! Type-checked access to a value's payload.
//!
//! The payload type is the selector: `value.get_ptr::<bool>()` is `Some` only
//! when the value holds a boolean, `value.get_ptr::<Array>()` only when it
//! holds an array, and so on. No accessor ever reinterprets one kind as
//! another; numeric kinds must match exactly (an unsigned value is not
//! readable as `i64`).
//!
//! | Payload type       | Kind       |
//! |--------------------|------------|
//! | `()`               | `null`     |
//! | `bool`             | `boolean`  |
//! | `i64`              | `integer`  |
//! | `u64`              | `unsigned` |
//! | `f64`              | `float`    |
//! | [`JsonString<A>`]  | `string`   |
//! | [`Array<A>`]       | `array`    |
//! | [`Object<A>`]      | `object`   |
//!
//! Pointer accessors (`get_ptr`, `get_mut_ptr`) never fail. The strict forms
//! (`get`, `get_ref`, `get_mut`) return a [`TypeError`] naming the stored kind.

use crate::alloc::Allocator;
use crate::error::{Context, Result, TypeError};
use crate::kind::Kind;
use crate::string::JsonString;
use crate::value::{Array, Object, Repr, Value};

/// A payload type that can be read out of a [`Value`].
pub trait Payload<A: Allocator>: Sized {
    /// Kind a value must hold for this payload to be readable.
    const KIND: Kind;

    fn from_value(value: &Value<A>) -> Option<&Self>;
}

/// A payload type that can be mutated in place.
///
/// Null has no payload to mutate and only implements [`Payload`].
pub trait PayloadMut<A: Allocator>: Payload<A> {
    fn from_value_mut(value: &mut Value<A>) -> Option<&mut Self>;
}

impl<A: Allocator> Payload<A> for () {
    const KIND: Kind = Kind::Null;

    fn from_value(value: &Value<A>) -> Option<&Self> {
        value.is_null().then_some(&())
    }
}

macro_rules! inline_payload {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<A: Allocator> Payload<A> for $ty {
                const KIND: Kind = Kind::$variant;

                fn from_value(value: &Value<A>) -> Option<&Self> {
                    match &value.repr {
                        Repr::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }

            impl<A: Allocator> PayloadMut<A> for $ty {
                fn from_value_mut(value: &mut Value<A>) -> Option<&mut Self> {
                    match &mut value.repr {
                        Repr::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }
        )*
    };
}

macro_rules! heap_payload {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<A: Allocator> Payload<A> for $ty {
                const KIND: Kind = Kind::$variant;

                fn from_value(value: &Value<A>) -> Option<&Self> {
                    match &value.repr {
                        Repr::$variant(owned) => Some(&**owned),
                        _ => None,
                    }
                }
            }

            impl<A: Allocator> PayloadMut<A> for $ty {
                fn from_value_mut(value: &mut Value<A>) -> Option<&mut Self> {
                    match &mut value.repr {
                        Repr::$variant(owned) => Some(&mut **owned),
                        _ => None,
                    }
                }
            }
        )*
    };
}

inline_payload! {
    bool => Boolean,
    i64 => Integer,
    u64 => Unsigned,
    f64 => Float,
}

heap_payload! {
    JsonString<A> => String,
    Array<A> => Array,
    Object<A> => Object,
}

impl<A: Allocator> Value<A> {
    /// Shared reference to the payload if this value holds `T`'s kind.
    pub fn get_ptr<T: Payload<A>>(&self) -> Option<&T> {
        T::from_value(self)
    }

    /// Mutable reference to the payload if this value holds `T`'s kind.
    pub fn get_mut_ptr<T: PayloadMut<A>>(&mut self) -> Option<&mut T> {
        T::from_value_mut(self)
    }

    /// Copy of the payload, or `type_error.302` if the kinds differ.
    ///
    /// Composite payloads are deep-copied.
    pub fn get<T: Payload<A> + Clone>(&self) -> Result<T> {
        match self.get_ptr::<T>() {
            Some(payload) => Ok(payload.clone()),
            None => Err(TypeError::new(
                302,
                format!("type must be {}, but is {}", T::KIND.name(), self.type_name()),
                Context::of(self),
            )
            .into()),
        }
    }

    /// Shared reference to the payload, or `type_error.303`.
    pub fn get_ref<T: Payload<A>>(&self) -> Result<&T> {
        let context = Context::of(self);
        let actual = self.type_name();
        self.get_ptr::<T>()
            .ok_or_else(|| reference_mismatch(actual, context).into())
    }

    /// Mutable reference to the payload, or `type_error.303`.
    pub fn get_mut<T: PayloadMut<A>>(&mut self) -> Result<&mut T> {
        let context = Context::of(self);
        let actual = self.type_name();
        self.get_mut_ptr::<T>()
            .ok_or_else(|| reference_mismatch(actual, context).into())
    }
}

fn reference_mismatch(actual: &str, context: Context<'_>) -> TypeError {
    TypeError::new(
        303,
        format!("incompatible ReferenceType for get_ref, actual type is {actual}"),
        context,
    )
}
