#![forbid(unsafe_code)]

//! Aliased (forwarding) properties.
//!
//! An alias makes `obj.key` read — and, depending on mode, write — through
//! another path. The interesting part is not the forwarding itself but the
//! dependency bookkeeping around it: an alias read must record `obj.key` as
//! the *caller's* dependency while suppressing the tracker during its own
//! target resolution, and it redirects `obj.key`'s tag onto the target's tag
//! so later staleness checks need no re-walk.
//!
//! # Write modes
//!
//! - **read-write** (default): writes forward to the target path.
//! - **one-way**: the first local write tears the alias down and replaces it
//!   with a plain stored field; the target is never written.
//! - **read-only**: writes fail with a descriptive error and mutate nothing.

use std::rc::Rc;

use tether_core::{Error, ObjectId, Path, Result, Value};

use crate::cache::CacheEntry;
use crate::descriptor::Descriptor;
use crate::runtime::Runtime;

/// Write policy of an [`AliasedProperty`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AliasKind {
    /// Forward both reads and writes.
    #[default]
    ReadWrite,
    /// Forward reads; the first local write converts the property into a
    /// plain stored field.
    OneWay,
    /// Forward reads; writes are an error.
    ReadOnly,
}

/// A computed-property implementation that forwards to another path.
///
/// Created once and shared (read-only) across every object it is installed
/// on; per-instance state lives in the runtime's side tables.
#[derive(Clone, Debug)]
pub struct AliasedProperty {
    alt_obj_path: Option<Path>,
    alt_key: String,
    kind: AliasKind,
}

impl AliasedProperty {
    /// An alias forwarding to `target`, a dotted path whose final segment is
    /// the aliased key. Fan-out (`@each`) targets are rejected.
    pub fn new(target: &str) -> Result<Self> {
        let path: Path = target.parse()?;
        if path.each_key().is_some() {
            return Err(Error::AliasThroughEach {
                path: target.to_owned(),
            });
        }
        let (alt_obj_path, alt_key) = path.split_last();
        Ok(Self {
            alt_obj_path,
            alt_key: alt_key.to_owned(),
            kind: AliasKind::ReadWrite,
        })
    }

    /// Switch to one-way mode.
    #[must_use]
    pub fn one_way(mut self) -> Self {
        self.kind = AliasKind::OneWay;
        self
    }

    /// Switch to read-only mode.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.kind = AliasKind::ReadOnly;
        self
    }

    /// The write policy.
    #[must_use]
    pub fn kind(&self) -> AliasKind {
        self.kind
    }

    /// The final key read on the target object.
    #[must_use]
    pub fn alt_key(&self) -> &str {
        &self.alt_key
    }

    /// The path to the target object, when it is not the holder itself.
    #[must_use]
    pub fn alt_obj_path(&self) -> Option<&Path> {
        self.alt_obj_path.as_ref()
    }

    /// The full forwarded path, as registered in watch bookkeeping.
    #[must_use]
    pub fn dependent_path(&self) -> String {
        match &self.alt_obj_path {
            Some(head) => format!("{head}.{}", self.alt_key),
            None => self.alt_key.clone(),
        }
    }
}

impl Runtime {
    /// Forwarded read. Records `obj.key` — not the target resolution — as the
    /// caller's dependency.
    pub(crate) fn alias_get(
        &mut self,
        alias: &Rc<AliasedProperty>,
        obj: ObjectId,
        key: &str,
    ) -> Value {
        // The target walk must not leak into the caller's tracker.
        let (alt_obj, value) = self.untracked(|rt| {
            let alt_obj = match alias.alt_obj_path() {
                Some(path) => rt.get_path(obj, path).as_object(),
                None => Some(obj),
            };
            let value = match alt_obj {
                Some(target) => rt.get(target, alias.alt_key()),
                None => Value::Null,
            };
            (alt_obj, value)
        });

        self.finish_lazy_chains(obj, key, &value);

        let property_tag = self.tag_for_property(obj, key);
        if let Some(target) = alt_obj {
            let alt_tag = self.tag_for_property(target, alias.alt_key());
            property_tag.redirect_to(&alt_tag);
        }
        self.consume(&property_tag);
        value
    }

    /// Forwarded (or mode-dependent) write.
    pub(crate) fn alias_set(
        &mut self,
        alias: &Rc<AliasedProperty>,
        obj: ObjectId,
        key: &str,
        value: Value,
    ) -> Result<()> {
        match alias.kind() {
            AliasKind::ReadWrite => {
                let alt_obj = match alias.alt_obj_path() {
                    Some(path) => self.untracked(|rt| rt.get_path(obj, path)).as_object(),
                    None => Some(obj),
                };
                let Some(target) = alt_obj else {
                    return Err(Error::AliasTargetMissing {
                        key: key.to_owned(),
                        target: obj,
                    });
                };
                self.set(target, alias.alt_key(), value)
            }
            AliasKind::OneWay => {
                // first local write consumes the alias semantics
                self.redefine_plain(obj, key)?;
                self.set(obj, key, value)
            }
            AliasKind::ReadOnly => Err(Error::ReadOnly {
                key: key.to_owned(),
                target: obj,
            }),
        }
    }

    /// Install-time hook: a key that is already watched registers its
    /// dependent path immediately.
    pub(crate) fn alias_setup(&mut self, alias: &Rc<AliasedProperty>, obj: ObjectId, key: &str) {
        if self.watch_count(obj, key) > 0 {
            self.alias_consume(alias, obj, key);
        }
    }

    /// Teardown hook, symmetric to [`Runtime::alias_setup`].
    pub(crate) fn alias_teardown(&mut self, alias: &Rc<AliasedProperty>, obj: ObjectId, key: &str) {
        self.alias_unconsume(alias, obj, key);
    }

    /// Mark the key consumed and register its dependent path for
    /// watch-forwarding. Idempotent via the cache sentinel.
    pub(crate) fn alias_consume(&mut self, alias: &Rc<AliasedProperty>, obj: ObjectId, key: &str) {
        let cache = self.cache_for(obj);
        if cache.is_consumed(key) {
            return;
        }
        cache.mark_consumed(key);
        self.watch(obj, &alias.dependent_path());
    }

    /// Undo [`Runtime::alias_consume`]: drop the dependent-path registration
    /// and clear the sentinel.
    pub(crate) fn alias_unconsume(
        &mut self,
        alias: &Rc<AliasedProperty>,
        obj: ObjectId,
        key: &str,
    ) {
        let was_consumed = matches!(self.peek_cache_entry(obj, key), Some(CacheEntry::Consumed));
        if was_consumed || self.watch_count(obj, key) > 0 {
            let dependent = alias.dependent_path();
            self.unwatch(obj, &dependent);
        }
        if was_consumed {
            if let Some(cache) = self.peek_cache_mut(obj) {
                cache.remove(key);
            }
        }
    }

    pub(crate) fn alias_descriptor_at(&self, obj: ObjectId, key: &str) -> Option<Rc<AliasedProperty>> {
        match self.descriptor_for(obj, key) {
            Some(Descriptor::Alias(alias)) => Some(alias),
            _ => None,
        }
    }
}
