#![forbid(unsafe_code)]

//! Per-object metadata side tables.
//!
//! A [`Meta`] holds everything the engine knows *about* an object without the
//! object owning it: the updatable tag per property slot, parked lazy chain
//! suffixes, last value-producing revisions for computed keys, watch counts,
//! and the destroyed flag. The table is keyed by [`ObjectId`], so entries for
//! destroyed objects go inert on their own and are reclaimed by the sweep.

use ahash::AHashMap;
use tether_core::{ObjectId, Path, Revision, Tag};

#[derive(Debug, Default)]
pub(crate) struct Meta {
    tags: AHashMap<String, Tag>,
    lazy_chains: AHashMap<String, Vec<(Path, Tag)>>,
    revisions: AHashMap<String, Revision>,
    watching: AHashMap<String, usize>,
    destroyed: bool,
}

impl Meta {
    /// The updatable tag bound to a property slot, created on first access.
    pub(crate) fn tag_for(&mut self, key: &str) -> Tag {
        if let Some(tag) = self.tags.get(key) {
            return tag.clone();
        }
        let tag = Tag::updatable();
        self.tags.insert(key.to_owned(), tag.clone());
        tag
    }

    pub(crate) fn peek_tag(&self, key: &str) -> Option<Tag> {
        self.tags.get(key).cloned()
    }

    pub(crate) fn last_revision(&self, key: &str) -> Option<Revision> {
        self.revisions.get(key).copied()
    }

    pub(crate) fn record_revision(&mut self, key: &str, revision: Revision) {
        self.revisions.insert(key.to_owned(), revision);
    }

    /// The placeholder tag parked for `(key, suffix)`, reusing a pending one
    /// so there is never more than one placeholder per remaining suffix.
    pub(crate) fn lazy_placeholder(&mut self, key: &str, suffix: &Path) -> Tag {
        let list = self.lazy_chains.entry(key.to_owned()).or_default();
        if let Some((_, tag)) = list.iter().find(|(pending, _)| pending == suffix) {
            return tag.clone();
        }
        let tag = Tag::updatable();
        list.push((suffix.clone(), tag.clone()));
        tag
    }

    /// Remove and return every chain parked under `key`.
    pub(crate) fn take_lazy_chains(&mut self, key: &str) -> Option<Vec<(Path, Tag)>> {
        self.lazy_chains.remove(key)
    }

    pub(crate) fn pending_lazy_chains(&self, key: &str) -> usize {
        self.lazy_chains.get(key).map_or(0, Vec::len)
    }

    pub(crate) fn bump_watch(&mut self, key: &str) -> usize {
        let count = self.watching.entry(key.to_owned()).or_insert(0);
        *count += 1;
        *count
    }

    /// Decrement the watch count, removing the entry at zero. Never goes
    /// negative; dropping an unwatched key stays at zero.
    pub(crate) fn drop_watch(&mut self, key: &str) -> usize {
        let Some(count) = self.watching.get_mut(key) else {
            return 0;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.watching.remove(key);
            0
        } else {
            *count
        }
    }

    pub(crate) fn watch_count(&self, key: &str) -> usize {
        self.watching.get(key).copied().unwrap_or(0)
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Runtime-owned table of per-object metas.
#[derive(Debug, Default)]
pub(crate) struct MetaTable {
    metas: AHashMap<ObjectId, Meta>,
}

impl MetaTable {
    pub(crate) fn get_or_create(&mut self, id: ObjectId) -> &mut Meta {
        self.metas.entry(id).or_default()
    }

    pub(crate) fn peek(&self, id: ObjectId) -> Option<&Meta> {
        self.metas.get(&id)
    }

    pub(crate) fn peek_mut(&mut self, id: ObjectId) -> Option<&mut Meta> {
        self.metas.get_mut(&id)
    }

    pub(crate) fn purge(&mut self, id: ObjectId) {
        self.metas.remove(&id);
    }

    pub(crate) fn destroyed_ids(&self) -> Vec<ObjectId> {
        self.metas
            .iter()
            .filter(|(_, meta)| meta.is_destroyed())
            .map(|(&id, _)| id)
            .collect()
    }
}
