#![forbid(unsafe_code)]

//! Error taxonomy for the tether engine.
//!
//! Everything here is synchronous and deterministic: there are no retries and
//! no partially-applied states. An error either surfaces at configuration
//! time (bad path, self-referential alias) or rejects a single mutation
//! without touching cache or tag state.

use thiserror::Error;

use crate::path::PathError;
use crate::value::ObjectId;

/// Convenience alias used across the tether crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the tether runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A dependency path failed to parse.
    #[error(transparent)]
    Path(#[from] PathError),

    /// An alias was declared to forward to its own key.
    #[error("alias '{key}' on {target} cannot reference itself")]
    AliasToSelf { key: String, target: ObjectId },

    /// An alias target path may not fan out over a collection.
    #[error("alias target '{path}' cannot contain '@each'")]
    AliasThroughEach { path: String },

    /// An alias write could not reach its target object.
    #[error("alias '{key}' on {target} has no reachable target object")]
    AliasTargetMissing { key: String, target: ObjectId },

    /// Write to a read-only property: a read-only alias, or a computed
    /// property without a setter. Nothing was mutated.
    #[error("cannot set read-only property '{key}' on {target}")]
    ReadOnly { key: String, target: ObjectId },

    /// A list operation was applied to a value that is not a collection.
    #[error("{target} is not a collection")]
    NotACollection { target: ObjectId },

    /// Named-property write attempted on a list object.
    #[error("cannot write property '{key}' on collection {target}")]
    CollectionProperty { key: String, target: ObjectId },

    /// Index out of bounds on a list operation.
    #[error("index {index} out of bounds for {target} of length {len}")]
    IndexOutOfBounds {
        target: ObjectId,
        index: usize,
        len: usize,
    },

    /// Mutation attempted on a destroyed object.
    #[error("{target} has been destroyed")]
    Destroyed { target: ObjectId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_errors_convert() {
        let err: Error = PathError::Empty.into();
        assert_eq!(err, Error::Path(PathError::Empty));
        assert_eq!(err.to_string(), "empty path");
    }

    #[test]
    fn messages_name_property_and_target() {
        let target = ObjectId::from_raw_parts(2, 0);
        let err = Error::ReadOnly {
            key: "name".into(),
            target,
        };
        let message = err.to_string();
        assert!(message.contains("name"));
        assert!(message.contains("object 2v0"));
    }
}
