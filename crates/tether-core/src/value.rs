#![forbid(unsafe_code)]

//! The dynamic value model.
//!
//! tether tracks dependencies through a dynamically-typed object graph.
//! [`Value`] is the currency: a handful of primitives plus [`ObjectId`]
//! references into a runtime's object heap. Only objects can be chained
//! through; every other variant terminates a dependency chain.

use std::fmt;

/// Generational handle to an object in a runtime's heap.
///
/// The generation makes stale handles harmless: once a slot is freed and
/// reused, old ids stop resolving. Side tables keyed by `ObjectId` are
/// therefore weak in effect — a dead id simply stops matching, and the sweep
/// purges the entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    /// Reassemble a handle from its parts. Intended for the heap that issued
    /// them; a fabricated id will simply fail to resolve.
    #[must_use]
    pub fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within the heap.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation this handle belongs to.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object {}v{}", self.index, self.generation)
    }
}

/// A dynamically-typed value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The absent value. Unknown properties read as `Null`.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Reference to a heap object (map or list).
    Object(ObjectId),
}

impl Value {
    /// True for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for [`Value::Object`].
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// The object handle, if this value is one.
    #[must_use]
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Short variant name, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Object(id) => write!(f, "{id}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::Object(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_round_trip() {
        let id = ObjectId::from_raw_parts(3, 1);
        let value = Value::from(id);
        assert!(value.is_object());
        assert_eq!(value.as_object(), Some(id));
        assert_eq!(id.index(), 3);
        assert_eq!(id.generation(), 1);
    }

    #[test]
    fn primitives_are_not_objects() {
        for value in [
            Value::Null,
            Value::from(true),
            Value::from(42),
            Value::from(1.5),
            Value::from("hi"),
        ] {
            assert!(!value.is_object());
            assert_eq!(value.as_object(), None);
        }
    }

    #[test]
    fn null_is_distinguishable() {
        assert!(Value::Null.is_null());
        assert!(!Value::from(0).is_null());
        assert_ne!(Value::Null, Value::from(false));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(7).to_string(), "7");
        assert_eq!(Value::from("x").to_string(), "\"x\"");
        assert_eq!(
            Value::from(ObjectId::from_raw_parts(0, 0)).to_string(),
            "object 0v0"
        );
    }
}
