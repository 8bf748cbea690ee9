#![forbid(unsafe_code)]

//! tether public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use tether_core as core;
pub use tether_runtime as runtime;

pub mod prelude {
    pub use tether_core::{Error, ObjectId, Path, Result, Revision, Tag, Value};
    pub use tether_runtime::{
        AliasKind, AliasedProperty, CacheEntry, ComputedProperty, Descriptor, ObserverHandle,
        Runtime,
    };
}
