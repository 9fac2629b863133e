//! The eight kinds a [`Value`](crate::Value) can hold.

use std::fmt;

/// Discriminant of a [`Value`](crate::Value).
///
/// Exactly one kind is active at any time. Numeric kinds stay distinct
/// (signed, unsigned, float) even though they share the user-facing name
/// `"number"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Object,
    Array,
    String,
    Boolean,
    Integer,
    Unsigned,
    Float,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Kind; 8] = [
        Kind::Null,
        Kind::Object,
        Kind::Array,
        Kind::String,
        Kind::Boolean,
        Kind::Integer,
        Kind::Unsigned,
        Kind::Float,
    ];

    /// Name used in error messages and diagnostics.
    ///
    /// All numeric kinds report `"number"`.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Boolean => "boolean",
            Kind::Integer | Kind::Unsigned | Kind::Float => "number",
        }
    }

    /// Arrays and objects: the kinds that contain further values.
    pub fn is_structured(self) -> bool {
        matches!(self, Kind::Array | Kind::Object)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
