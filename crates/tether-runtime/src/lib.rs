#![forbid(unsafe_code)]

//! Dependency-tracking reactivity runtime for dynamically-typed object
//! graphs.
//!
//! A [`Runtime`] lets derived values (computed properties, aliases) and
//! external observers stay consistent with mutations to an object graph
//! without eagerly recomputing anything. Every property slot carries a
//! versioned invalidation [`Tag`]; dotted dependency paths are walked lazily
//! into combined tags; observers are revalidated by a periodic
//! [`sweep`](Runtime::sweep) rather than pushed to synchronously.
//!
//! # Example
//!
//! ```
//! use tether_runtime::{Runtime, Value};
//!
//! let mut rt = Runtime::new();
//! let user = rt.create_object_with([("first", Value::from("Ada"))]);
//!
//! let tag = rt.chain_tag_str(user, "first").unwrap();
//! let baseline = tag.value();
//! assert!(tag.validate(baseline));
//!
//! rt.set(user, "first", Value::from("Grace")).unwrap();
//! assert!(!tag.validate(baseline));
//! ```
//!
//! # Architecture
//!
//! - `runtime` — the context owning the clock, object heap, side tables,
//!   listener bus and observer registry; property get/set dispatch.
//! - `chains` — the lazy chain walker and `finish_lazy_chains`.
//! - `descriptor` — computed properties and the per-(object, key) registry.
//! - `alias` — forwarding properties with read-write/one-way/read-only modes.
//! - `cache` — the per-object computed-value cache.
//! - `observer` — the active-observer registry and revalidation sweep.
//! - `events` — the change-event listener bus.

pub mod alias;
pub mod cache;
pub mod chains;
pub mod descriptor;
pub mod events;
mod heap;
mod meta;
pub mod observer;
pub mod runtime;

pub use alias::{AliasKind, AliasedProperty};
pub use cache::{CacheEntry, ComputedCache};
pub use chains::CONTENT_KEY;
pub use descriptor::{ComputedProperty, Descriptor};
pub use events::{ListenerFn, ListenerId};
pub use heap::ObjectBody;
pub use observer::{ObserverHandle, change_event};
pub use runtime::Runtime;

pub use tether_core::{
    Error, ObjectId, Path, PathError, Result, Revision, RevisionClock, Tag, Value,
};
