#![forbid(unsafe_code)]

//! Computed-property descriptors and the per-(object, key) registry.
//!
//! Property dispatch is duck-typed: a slot is a plain field unless a
//! [`Descriptor`] is installed for it, in which case reads and writes go
//! through the descriptor instead. The two descriptor kinds are a
//! [`ComputedProperty`] (derived, memoized value) and an
//! [`AliasedProperty`](crate::alias::AliasedProperty) (forwarding).
//!
//! # Memoization
//!
//! A computed value is served from cache while its property tag still
//! validates the revision recorded when the value was produced. On a miss the
//! getter runs inside a fresh dependency tracker; the tags it consumed,
//! combined with the chain tags of any declared dependent keys, become the
//! property tag's redirect target. That redirect is what makes the *next*
//! dependency mutation flip the recorded revision stale.

use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use tether_core::{Error, ObjectId, Path, Result, Tag, Value};

use crate::alias::AliasedProperty;
use crate::cache::CacheEntry;
use crate::runtime::Runtime;

type Getter = Box<dyn Fn(&mut Runtime, ObjectId) -> Value>;
type Setter = Box<dyn Fn(&mut Runtime, ObjectId, Value) -> Value>;

/// A derived, memoized property.
pub struct ComputedProperty {
    getter: Getter,
    setter: Option<Setter>,
    dependent_keys: Vec<Path>,
}

impl ComputedProperty {
    /// A computed property with the given getter and no setter (read-only).
    #[must_use]
    pub fn new(getter: impl Fn(&mut Runtime, ObjectId) -> Value + 'static) -> Self {
        Self {
            getter: Box::new(getter),
            setter: None,
            dependent_keys: Vec::new(),
        }
    }

    /// Declare an explicit dependent path, walked in addition to whatever the
    /// getter consumes while running. Rejects malformed paths.
    pub fn depends_on(mut self, path: &str) -> Result<Self> {
        self.dependent_keys.push(path.parse::<Path>()?);
        Ok(self)
    }

    /// Install a setter. The value it returns is what gets memoized.
    #[must_use]
    pub fn with_setter(
        mut self,
        setter: impl Fn(&mut Runtime, ObjectId, Value) -> Value + 'static,
    ) -> Self {
        self.setter = Some(Box::new(setter));
        self
    }

    pub(crate) fn dependent_keys(&self) -> &[Path] {
        &self.dependent_keys
    }
}

impl fmt::Debug for ComputedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedProperty")
            .field("settable", &self.setter.is_some())
            .field("dependent_keys", &self.dependent_keys)
            .finish()
    }
}

/// The duck-typed dispatch variant for one property slot.
#[derive(Clone, Debug)]
pub enum Descriptor {
    /// Derived, memoized value.
    Computed(Rc<ComputedProperty>),
    /// Read/write forwarding to another path.
    Alias(Rc<AliasedProperty>),
}

/// Registry of installed descriptors, keyed by (object, key).
#[derive(Debug, Default)]
pub(crate) struct DescriptorTable {
    entries: AHashMap<ObjectId, AHashMap<String, Descriptor>>,
}

impl DescriptorTable {
    pub(crate) fn lookup(&self, id: ObjectId, key: &str) -> Option<Descriptor> {
        self.entries.get(&id).and_then(|m| m.get(key)).cloned()
    }

    pub(crate) fn install(&mut self, id: ObjectId, key: &str, descriptor: Descriptor) {
        self.entries
            .entry(id)
            .or_default()
            .insert(key.to_owned(), descriptor);
    }

    pub(crate) fn remove(&mut self, id: ObjectId, key: &str) -> Option<Descriptor> {
        let slots = self.entries.get_mut(&id)?;
        let removed = slots.remove(key);
        if slots.is_empty() {
            self.entries.remove(&id);
        }
        removed
    }

    pub(crate) fn purge_object(&mut self, id: ObjectId) {
        self.entries.remove(&id);
    }
}

impl Runtime {
    /// Memoized read of a computed property.
    pub(crate) fn computed_get(
        &mut self,
        property: &Rc<ComputedProperty>,
        obj: ObjectId,
        key: &str,
    ) -> Value {
        let property_tag = self.tag_for_property(obj, key);
        if let Some(cached) = self.validated_cache_hit(&property_tag, obj, key) {
            self.consume(&property_tag);
            return cached;
        }

        let (value, consumed) = self.track(|rt| (property.getter)(rt, obj));
        let mut tags = vec![consumed];
        if !property.dependent_keys().is_empty() {
            tags.push(self.chain_tags_for_keys(obj, property.dependent_keys()));
        }
        property_tag.redirect_to(&Tag::combine(tags));

        self.record_revision(obj, key, property_tag.value());
        self.cache_for(obj).insert_value(key, value.clone());
        self.finish_lazy_chains(obj, key, &value);
        self.consume(&property_tag);
        value
    }

    /// Write through a computed property's setter, memoizing its result.
    /// Setter-less computeds are read-only.
    pub(crate) fn computed_set(
        &mut self,
        property: &Rc<ComputedProperty>,
        obj: ObjectId,
        key: &str,
        value: Value,
    ) -> Result<()> {
        let Some(setter) = &property.setter else {
            return Err(Error::ReadOnly {
                key: key.to_owned(),
                target: obj,
            });
        };
        let stored = self.untracked(|rt| setter(rt, obj, value));

        let property_tag = self.tag_for_property(obj, key);
        property_tag.dirty(self.clock());
        self.record_revision(obj, key, property_tag.value());
        self.cache_for(obj).insert_value(key, stored.clone());
        self.finish_lazy_chains(obj, key, &stored);
        Ok(())
    }

    /// Cached value for `(obj, key)` if the property tag still validates the
    /// revision recorded when the value was produced.
    fn validated_cache_hit(&self, tag: &Tag, obj: ObjectId, key: &str) -> Option<Value> {
        let last = self.last_revision_for(obj, key)?;
        if !tag.validate(last) {
            return None;
        }
        match self.peek_cache_entry(obj, key) {
            Some(CacheEntry::Value(v)) => Some(v.clone()),
            _ => None,
        }
    }
}
