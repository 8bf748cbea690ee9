#![forbid(unsafe_code)]

//! The runtime context.
//!
//! One [`Runtime`] owns everything the engine needs: the revision clock, the
//! object heap, the per-object side tables (meta, computed cache, descriptor
//! registry), the listener bus, the observer registry, and the ambient
//! dependency tracker. There is no global state — every operation takes the
//! runtime explicitly, and `&mut` receivers are what serialize the multi-step
//! walk/redirect sequences that must not interleave.
//!
//! # Property dispatch
//!
//! A property slot is duck-typed per (object, key): a plain stored field
//! unless a [`Descriptor`] is installed, in which case reads and writes go
//! through the computed or alias implementation. Reads never fail — unknown
//! properties, destroyed targets, and traversal through primitives all read
//! as [`Value::Null`]. Writes are fallible: read-only properties, destroyed
//! targets, and shape mismatches reject the mutation without touching state.

use std::rc::Rc;

use ahash::AHashMap;
use tether_core::{Error, ObjectId, Path, Result, Revision, RevisionClock, Tag, Value};
use tracing::debug;

use crate::alias::AliasedProperty;
use crate::cache::{CacheEntry, CacheTable, ComputedCache};
use crate::chains::CONTENT_KEY;
use crate::descriptor::{ComputedProperty, Descriptor, DescriptorTable};
use crate::events::ListenerBus;
use crate::heap::{ObjectBody, ObjectHeap};
use crate::meta::{Meta, MetaTable};
use crate::observer::ObserverRegistry;

/// Collects the tags consumed while a tracked computation runs.
#[derive(Debug, Default)]
struct Tracker {
    tags: Vec<Tag>,
}

impl Tracker {
    fn add(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    fn into_tag(self) -> Tag {
        Tag::combine(self.tags)
    }
}

/// The dependency-tracking reactivity runtime.
pub struct Runtime {
    pub(crate) clock: RevisionClock,
    pub(crate) heap: ObjectHeap,
    pub(crate) metas: MetaTable,
    pub(crate) caches: CacheTable,
    pub(crate) descriptors: DescriptorTable,
    pub(crate) bus: ListenerBus,
    pub(crate) observers: ObserverRegistry,
    tracker: Option<Tracker>,
}

impl Runtime {
    /// A fresh, empty runtime.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: RevisionClock::new(),
            heap: ObjectHeap::default(),
            metas: MetaTable::default(),
            caches: CacheTable::default(),
            descriptors: DescriptorTable::default(),
            bus: ListenerBus::default(),
            observers: ObserverRegistry::default(),
            tracker: None,
        }
    }

    /// The runtime's logical clock.
    #[must_use]
    pub fn clock(&self) -> &RevisionClock {
        &self.clock
    }

    // ── Object lifecycle ─────────────────────────────────────────────

    /// Allocate an empty map object.
    pub fn create_object(&mut self) -> ObjectId {
        self.heap.alloc(ObjectBody::Map(AHashMap::new()))
    }

    /// Allocate a map object with initial fields.
    pub fn create_object_with<K, I>(&mut self, entries: I) -> ObjectId
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let fields = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.heap.alloc(ObjectBody::Map(fields))
    }

    /// Allocate an empty list object.
    pub fn create_list(&mut self) -> ObjectId {
        self.heap.alloc(ObjectBody::List(Vec::new()))
    }

    /// Allocate a list object with initial elements.
    pub fn create_list_with(&mut self, items: impl IntoIterator<Item = Value>) -> ObjectId {
        self.heap.alloc(ObjectBody::List(items.into_iter().collect()))
    }

    /// Number of live objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.heap.len()
    }

    /// Mark `obj` destroyed and free its heap slot.
    ///
    /// Reads return `Null` and writes error from this point on; the object's
    /// side-table entries are reclaimed by the next [`sweep`](Runtime::sweep).
    pub fn destroy(&mut self, obj: ObjectId) {
        if self.is_destroyed(obj) {
            return;
        }
        self.metas.get_or_create(obj).mark_destroyed();
        self.heap.free(obj);
        debug!(target: "tether::runtime", object = %obj, "object destroyed");
    }

    /// True once `obj` has been destroyed (or never existed).
    #[must_use]
    pub fn is_destroyed(&self, obj: ObjectId) -> bool {
        self.metas.peek(obj).is_some_and(Meta::is_destroyed) || !self.heap.contains(obj)
    }

    // ── Dependency tracking ──────────────────────────────────────────

    /// Run `f` with a fresh dependency tracker; return its result and the
    /// combined tag of every property it consumed.
    pub fn track<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> (R, Tag) {
        let parent = self.tracker.replace(Tracker::default());
        let result = f(self);
        let tracker = std::mem::replace(&mut self.tracker, parent)
            .expect("tracker installed at scope entry");
        (result, tracker.into_tag())
    }

    /// Run `f` with dependency tracking suspended, restoring the outer
    /// tracker afterwards.
    pub fn untracked<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let parent = self.tracker.take();
        let result = f(self);
        self.tracker = parent;
        result
    }

    /// Record `tag` into the ambient tracker, if one is active.
    pub fn consume(&mut self, tag: &Tag) {
        if let Some(tracker) = &mut self.tracker {
            tracker.add(tag.clone());
        }
    }

    /// The updatable tag bound to the `(obj, key)` property slot, created on
    /// first access. Writing the property dirties this tag.
    pub fn tag_for_property(&mut self, obj: ObjectId, key: &str) -> Tag {
        self.metas.get_or_create(obj).tag_for(key)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Read `obj.key` through descriptor dispatch. Infallible: unknown
    /// properties and destroyed targets read as `Null`.
    pub fn get(&mut self, obj: ObjectId, key: &str) -> Value {
        if self.is_destroyed(obj) {
            return Value::Null;
        }
        match self.descriptor_for(obj, key) {
            Some(Descriptor::Computed(property)) => self.computed_get(&property, obj, key),
            Some(Descriptor::Alias(alias)) => self.alias_get(&alias, obj, key),
            None => self.plain_get(obj, key),
        }
    }

    /// Read a dotted path segment-wise, stopping (with `Null`) at the first
    /// primitive. Fan-out paths cannot be read, only observed.
    pub fn get_path(&mut self, obj: ObjectId, path: &Path) -> Value {
        if path.each_key().is_some() {
            return Value::Null;
        }
        let Some((last, init)) = path.stems().split_last() else {
            return Value::Null;
        };
        let mut current = obj;
        for segment in init {
            match self.get(current, segment).as_object() {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
        self.get(current, last)
    }

    /// Parse `path` and read it.
    pub fn get_path_str(&mut self, obj: ObjectId, path: &str) -> Result<Value> {
        let parsed: Path = path.parse()?;
        Ok(self.get_path(obj, &parsed))
    }

    fn plain_get(&mut self, obj: ObjectId, key: &str) -> Value {
        let is_list = self.heap.body(obj).is_some_and(ObjectBody::is_list);
        let slot = if is_list && key == "length" {
            CONTENT_KEY
        } else {
            key
        };
        let tag = self.tag_for_property(obj, slot);
        self.consume(&tag);
        self.peek_property(obj, key)
    }

    /// Raw storage read: no dispatch, no tracking.
    pub(crate) fn peek_property(&self, obj: ObjectId, key: &str) -> Value {
        match self.heap.body(obj) {
            Some(ObjectBody::Map(fields)) => fields.get(key).cloned().unwrap_or(Value::Null),
            Some(ObjectBody::List(items)) => match key {
                "length" => Value::Int(items.len() as i64),
                _ => Value::Null,
            },
            None => Value::Null,
        }
    }

    pub(crate) fn peek_body(&self, obj: ObjectId) -> Option<&ObjectBody> {
        self.heap.body(obj)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Write `obj.key` through descriptor dispatch.
    pub fn set(&mut self, obj: ObjectId, key: &str, value: Value) -> Result<()> {
        if self.is_destroyed(obj) {
            return Err(Error::Destroyed { target: obj });
        }
        match self.descriptor_for(obj, key) {
            Some(Descriptor::Computed(property)) => self.computed_set(&property, obj, key, value),
            Some(Descriptor::Alias(alias)) => self.alias_set(&alias, obj, key, value),
            None => self.plain_set(obj, key, value),
        }
    }

    fn plain_set(&mut self, obj: ObjectId, key: &str, value: Value) -> Result<()> {
        let changed = match self.heap.body_mut(obj) {
            Some(ObjectBody::Map(fields)) => {
                let previous = fields.insert(key.to_owned(), value.clone());
                previous.as_ref() != Some(&value)
            }
            Some(ObjectBody::List(_)) => {
                return Err(Error::CollectionProperty {
                    key: key.to_owned(),
                    target: obj,
                });
            }
            None => return Err(Error::Destroyed { target: obj }),
        };
        // writing back an identical value is invisible to consumers
        if changed {
            let tag = self.tag_for_property(obj, key);
            tag.dirty(&self.clock);
            self.finish_lazy_chains(obj, key, &value);
        }
        Ok(())
    }

    /// Manually flag `obj.key` as changed, for hosts that mutate storage out
    /// of band.
    pub fn notify_property_change(&mut self, obj: ObjectId, key: &str) {
        let tag = self.tag_for_property(obj, key);
        tag.dirty(&self.clock);
        let value = self.peek_property(obj, key);
        self.finish_lazy_chains(obj, key, &value);
    }

    // ── Lists ────────────────────────────────────────────────────────

    /// Append to a list, dirtying its content tag.
    pub fn list_push(&mut self, list: ObjectId, value: Value) -> Result<()> {
        match self.heap.body_mut(list) {
            Some(ObjectBody::List(items)) => items.push(value),
            Some(ObjectBody::Map(_)) => return Err(Error::NotACollection { target: list }),
            None => return Err(Error::Destroyed { target: list }),
        }
        self.content_did_change(list);
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn list_remove(&mut self, list: ObjectId, index: usize) -> Result<Value> {
        let removed = match self.heap.body_mut(list) {
            Some(ObjectBody::List(items)) => {
                if index >= items.len() {
                    return Err(Error::IndexOutOfBounds {
                        target: list,
                        index,
                        len: items.len(),
                    });
                }
                items.remove(index)
            }
            Some(ObjectBody::Map(_)) => return Err(Error::NotACollection { target: list }),
            None => return Err(Error::Destroyed { target: list }),
        };
        self.content_did_change(list);
        Ok(removed)
    }

    /// Replace the element at `index`.
    pub fn list_set(&mut self, list: ObjectId, index: usize, value: Value) -> Result<()> {
        match self.heap.body_mut(list) {
            Some(ObjectBody::List(items)) => {
                if index >= items.len() {
                    return Err(Error::IndexOutOfBounds {
                        target: list,
                        index,
                        len: items.len(),
                    });
                }
                items[index] = value;
            }
            Some(ObjectBody::Map(_)) => return Err(Error::NotACollection { target: list }),
            None => return Err(Error::Destroyed { target: list }),
        }
        self.content_did_change(list);
        Ok(())
    }

    /// Element at `index`, or `Null` when out of bounds.
    #[must_use]
    pub fn list_get(&self, list: ObjectId, index: usize) -> Value {
        match self.heap.body(list) {
            Some(ObjectBody::List(items)) => items.get(index).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Length of a live list.
    #[must_use]
    pub fn list_len(&self, list: ObjectId) -> Option<usize> {
        match self.heap.body(list) {
            Some(ObjectBody::List(items)) => Some(items.len()),
            _ => None,
        }
    }

    fn content_did_change(&mut self, list: ObjectId) {
        let tag = self.tag_for_property(list, CONTENT_KEY);
        tag.dirty(&self.clock);
    }

    // ── Descriptors ──────────────────────────────────────────────────

    /// The descriptor installed at `(obj, key)`, if any.
    #[must_use]
    pub fn descriptor_for(&self, obj: ObjectId, key: &str) -> Option<Descriptor> {
        self.descriptors.lookup(obj, key)
    }

    /// Install a computed property at `(obj, key)`.
    pub fn define_computed(
        &mut self,
        obj: ObjectId,
        key: &str,
        property: ComputedProperty,
    ) -> Result<()> {
        self.install_descriptor(obj, key, Descriptor::Computed(Rc::new(property)))
    }

    /// Install an alias at `(obj, key)`. Self-referential aliases are a
    /// configuration error.
    pub fn define_alias(&mut self, obj: ObjectId, key: &str, alias: AliasedProperty) -> Result<()> {
        self.install_descriptor(obj, key, Descriptor::Alias(Rc::new(alias)))
    }

    /// Remove any descriptor at `(obj, key)`, leaving a plain stored field.
    pub fn redefine_plain(&mut self, obj: ObjectId, key: &str) -> Result<()> {
        if self.is_destroyed(obj) {
            return Err(Error::Destroyed { target: obj });
        }
        if let Some(old) = self.descriptors.remove(obj, key) {
            if let Descriptor::Alias(alias) = old {
                self.alias_teardown(&alias, obj, key);
            }
            if let Some(cache) = self.caches.peek_mut(obj) {
                cache.remove(key);
            }
            let tag = self.tag_for_property(obj, key);
            tag.dirty(&self.clock);
            // the slot is a standalone field again; drop any forwarding the
            // old descriptor installed
            tag.redirect_to(&Tag::constant());
        }
        Ok(())
    }

    fn install_descriptor(&mut self, obj: ObjectId, key: &str, descriptor: Descriptor) -> Result<()> {
        if self.is_destroyed(obj) {
            return Err(Error::Destroyed { target: obj });
        }
        if let Descriptor::Alias(alias) = &descriptor {
            if alias.alt_obj_path().is_none() && alias.alt_key() == key {
                return Err(Error::AliasToSelf {
                    key: key.to_owned(),
                    target: obj,
                });
            }
        }
        self.redefine_plain(obj, key)?;
        if let Descriptor::Alias(alias) = &descriptor {
            let alias = Rc::clone(alias);
            self.alias_setup(&alias, obj, key);
        }
        self.descriptors.install(obj, key, descriptor);
        // whatever was memoized under this key is now meaningless
        let tag = self.tag_for_property(obj, key);
        tag.dirty(&self.clock);
        Ok(())
    }

    // ── Watch bookkeeping ────────────────────────────────────────────

    /// Register interest in `(obj, key)` for legacy string-path forwarding.
    /// The first watch of an aliased key consumes the alias.
    pub fn watch(&mut self, obj: ObjectId, key: &str) {
        let count = self.metas.get_or_create(obj).bump_watch(key);
        if count == 1 {
            if let Some(alias) = self.alias_descriptor_at(obj, key) {
                self.alias_consume(&alias, obj, key);
            }
        }
    }

    /// Drop one watch registration; the last one unconsumes an alias.
    pub fn unwatch(&mut self, obj: ObjectId, key: &str) {
        let Some(meta) = self.metas.peek_mut(obj) else {
            return;
        };
        let remaining = meta.drop_watch(key);
        if remaining == 0 {
            if let Some(alias) = self.alias_descriptor_at(obj, key) {
                self.alias_unconsume(&alias, obj, key);
            }
        }
    }

    /// Current watch count for `(obj, key)`.
    #[must_use]
    pub fn watch_count(&self, obj: ObjectId, key: &str) -> usize {
        self.metas.peek(obj).map_or(0, |meta| meta.watch_count(key))
    }

    // ── Caches & revisions ───────────────────────────────────────────

    /// The computed cache for `obj`, created on first access.
    pub fn cache_for(&mut self, obj: ObjectId) -> &mut ComputedCache {
        self.caches.cache_for(obj)
    }

    /// Non-creating cache lookup.
    #[must_use]
    pub fn peek_cache(&self, obj: ObjectId) -> Option<&ComputedCache> {
        self.caches.peek(obj)
    }

    /// Convenience read of a memoized value, without forcing computation.
    #[must_use]
    pub fn cached_value(&self, obj: ObjectId, key: &str) -> Option<Value> {
        self.caches.peek(obj).and_then(|c| c.value(key)).cloned()
    }

    pub(crate) fn peek_cache_entry(&self, obj: ObjectId, key: &str) -> Option<&CacheEntry> {
        self.caches.cached_entry(obj, key)
    }

    pub(crate) fn peek_cache_mut(&mut self, obj: ObjectId) -> Option<&mut ComputedCache> {
        self.caches.peek_mut(obj)
    }

    /// The revision recorded when `(obj, key)` last produced a value.
    #[must_use]
    pub fn last_revision_for(&self, obj: ObjectId, key: &str) -> Option<Revision> {
        self.metas.peek(obj).and_then(|meta| meta.last_revision(key))
    }

    pub(crate) fn record_revision(&mut self, obj: ObjectId, key: &str, revision: Revision) {
        self.metas.get_or_create(obj).record_revision(key, revision);
    }

    /// Number of lazy chains parked at `(obj, key)`, for diagnostics.
    #[must_use]
    pub fn pending_lazy_chains(&self, obj: ObjectId, key: &str) -> usize {
        self.metas
            .peek(obj)
            .map_or(0, |meta| meta.pending_lazy_chains(key))
    }

    pub(crate) fn meta_for(&mut self, obj: ObjectId) -> &mut Meta {
        self.metas.get_or_create(obj)
    }

    pub(crate) fn peek_meta_mut(&mut self, obj: ObjectId) -> Option<&mut Meta> {
        self.metas.peek_mut(obj)
    }

    // ── Reclamation ──────────────────────────────────────────────────

    /// Drop every side-table entry for `obj`.
    pub(crate) fn purge_object(&mut self, obj: ObjectId) {
        self.observers.purge(obj);
        self.metas.purge(obj);
        self.caches.purge(obj);
        self.descriptors.purge_object(obj);
        self.bus.purge_object(obj);
    }

    /// Purge side tables for everything flagged destroyed.
    pub(crate) fn collect_destroyed(&mut self) {
        for id in self.metas.destroyed_ids() {
            self.purge_object(id);
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("objects", &self.heap.len())
            .field("revision", &self.clock.current())
            .field("tracking", &self.tracker.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_round_trip_and_unknown_reads() {
        let mut rt = Runtime::new();
        let obj = rt.create_object_with([("name", Value::from("ada"))]);
        assert_eq!(rt.get(obj, "name"), Value::from("ada"));
        assert_eq!(rt.get(obj, "missing"), Value::Null);

        rt.set(obj, "name", Value::from("grace")).unwrap();
        assert_eq!(rt.get(obj, "name"), Value::from("grace"));
    }

    #[test]
    fn writes_dirty_the_property_tag() {
        let mut rt = Runtime::new();
        let obj = rt.create_object_with([("x", Value::from(1))]);
        let tag = rt.tag_for_property(obj, "x");
        let baseline = tag.value();

        rt.set(obj, "x", Value::from(2)).unwrap();
        assert!(!tag.validate(baseline));
    }

    #[test]
    fn equal_value_write_is_invisible() {
        let mut rt = Runtime::new();
        let obj = rt.create_object_with([("x", Value::from(1))]);
        let tag = rt.tag_for_property(obj, "x");
        let baseline = tag.value();

        rt.set(obj, "x", Value::from(1)).unwrap();
        assert!(tag.validate(baseline), "no version bump for identical value");
    }

    #[test]
    fn track_collects_consumed_reads() {
        let mut rt = Runtime::new();
        let obj = rt.create_object_with([("a", Value::from(1)), ("b", Value::from(2))]);

        let (_, tag) = rt.track(|rt| {
            let _ = rt.get(obj, "a");
        });
        let baseline = tag.value();

        rt.set(obj, "b", Value::from(3)).unwrap();
        assert!(tag.validate(baseline), "untouched key is not a dependency");
        rt.set(obj, "a", Value::from(4)).unwrap();
        assert!(!tag.validate(baseline));
    }

    #[test]
    fn untracked_reads_leave_no_trace() {
        let mut rt = Runtime::new();
        let obj = rt.create_object_with([("a", Value::from(1))]);

        let (_, tag) = rt.track(|rt| {
            rt.untracked(|rt| {
                let _ = rt.get(obj, "a");
            });
        });
        let baseline = tag.value();
        rt.set(obj, "a", Value::from(2)).unwrap();
        assert!(tag.validate(baseline), "suppressed read recorded nothing");
    }

    #[test]
    fn get_path_walks_and_stops_at_primitives() {
        let mut rt = Runtime::new();
        let leaf = rt.create_object_with([("c", Value::from(3))]);
        let mid = rt.create_object_with([("b", Value::from(leaf))]);
        let root = rt.create_object_with([("a", Value::from(mid))]);

        assert_eq!(rt.get_path_str(root, "a.b.c").unwrap(), Value::from(3));
        assert_eq!(rt.get_path_str(root, "a.b.c.d").unwrap(), Value::Null);
        assert_eq!(rt.get_path_str(root, "missing.x").unwrap(), Value::Null);
        assert!(rt.get_path_str(root, "a..c").is_err());
    }

    #[test]
    fn destroyed_objects_read_null_and_reject_writes() {
        let mut rt = Runtime::new();
        let obj = rt.create_object_with([("x", Value::from(1))]);
        rt.destroy(obj);

        assert!(rt.is_destroyed(obj));
        assert_eq!(rt.get(obj, "x"), Value::Null);
        assert_eq!(
            rt.set(obj, "x", Value::from(2)),
            Err(Error::Destroyed { target: obj })
        );
        // destroy is idempotent
        rt.destroy(obj);
    }

    #[test]
    fn sweep_reclaims_side_tables_of_destroyed_objects() {
        let mut rt = Runtime::new();
        let obj = rt.create_object_with([("x", Value::from(1))]);
        let _ = rt.tag_for_property(obj, "x");
        rt.cache_for(obj).insert_value("x", Value::from(1));
        assert!(rt.peek_cache(obj).is_some());

        rt.destroy(obj);
        rt.sweep();
        assert!(rt.peek_cache(obj).is_none());
        assert_eq!(rt.object_count(), 0);
    }

    #[test]
    fn list_reads_and_length_tracking() {
        let mut rt = Runtime::new();
        let list = rt.create_list_with([Value::from(1), Value::from(2)]);

        assert_eq!(rt.list_len(list), Some(2));
        assert_eq!(rt.list_get(list, 0), Value::from(1));
        assert_eq!(rt.list_get(list, 9), Value::Null);
        assert_eq!(rt.get(list, "length"), Value::from(2));

        let (_, tag) = rt.track(|rt| {
            let _ = rt.get(list, "length");
        });
        let baseline = tag.value();
        rt.list_push(list, Value::from(3)).unwrap();
        assert!(!tag.validate(baseline), "length read depends on content tag");
        assert_eq!(rt.get(list, "length"), Value::from(3));
    }

    #[test]
    fn list_mutation_errors() {
        let mut rt = Runtime::new();
        let map = rt.create_object();
        let list = rt.create_list();

        assert_eq!(
            rt.list_push(map, Value::from(1)),
            Err(Error::NotACollection { target: map })
        );
        assert!(matches!(
            rt.list_remove(list, 0),
            Err(Error::IndexOutOfBounds { .. })
        ));
        assert_eq!(
            rt.set(list, "name", Value::from("x")),
            Err(Error::CollectionProperty {
                key: "name".into(),
                target: list
            })
        );
    }

    #[test]
    fn list_set_replaces_and_dirties_content() {
        let mut rt = Runtime::new();
        let list = rt.create_list_with([Value::from(1)]);
        let tag = rt.tag_for_property(list, CONTENT_KEY);
        let baseline = tag.value();

        rt.list_set(list, 0, Value::from(9)).unwrap();
        assert_eq!(rt.list_get(list, 0), Value::from(9));
        assert!(!tag.validate(baseline));
    }

    #[test]
    fn redefining_a_property_busts_its_memo() {
        let mut rt = Runtime::new();
        let obj = rt.create_object_with([("x", Value::from(1))]);
        rt.define_computed(obj, "c", ComputedProperty::new(|rt, this| rt.get(this, "x")))
            .unwrap();
        assert_eq!(rt.get(obj, "c"), Value::from(1));
        assert_eq!(rt.cached_value(obj, "c"), Some(Value::from(1)));

        rt.redefine_plain(obj, "c").unwrap();
        assert_eq!(rt.cached_value(obj, "c"), None);
        assert_eq!(rt.get(obj, "c"), Value::Null, "now a plain, unset field");

        rt.set(obj, "c", Value::from(7)).unwrap();
        assert_eq!(rt.get(obj, "c"), Value::from(7));
    }

    #[test]
    fn recycled_slot_does_not_inherit_side_tables() {
        let mut rt = Runtime::new();
        let old = rt.create_object_with([("x", Value::from(1))]);
        let _ = rt.tag_for_property(old, "x");
        rt.destroy(old);
        rt.sweep();

        let new = rt.create_object_with([("x", Value::from(2))]);
        assert_eq!(new.index(), old.index(), "slot reused");
        assert_ne!(new.generation(), old.generation());
        assert!(rt.is_destroyed(old));
        assert!(!rt.is_destroyed(new));
        assert_eq!(rt.get(old, "x"), Value::Null);
        assert_eq!(rt.get(new, "x"), Value::from(2));
    }
}
