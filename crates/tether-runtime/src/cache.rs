#![forbid(unsafe_code)]

//! The per-object computed-value cache.
//!
//! Memoizes derived values and doubles as the "was this key ever consumed"
//! record for alias bookkeeping. The distinction the whole engine leans on:
//! an *absent* entry means the key was never computed, which is not the same
//! thing as a key that computed to [`Value::Null`] — both states exist and
//! both must validate differently.

use ahash::AHashMap;
use tether_core::{ObjectId, Value};

/// Cached state for one computed or aliased key.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheEntry {
    /// A memoized computed value.
    Value(Value),
    /// Alias bookkeeping sentinel: the key's dependent paths have been
    /// registered, but no real cached value applies. Distinct from every
    /// legitimate value, including `Null`.
    Consumed,
}

/// Computed-value cache for a single object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComputedCache {
    entries: AHashMap<String, CacheEntry>,
}

impl ComputedCache {
    /// The raw entry for `key`, if the key was ever computed or consumed.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// The memoized value for `key`. `None` for both "never computed" and
    /// "consumed sentinel"; use [`ComputedCache::get`] to tell them apart.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.entries.get(key) {
            Some(CacheEntry::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// True if `key` carries the consumed sentinel.
    #[must_use]
    pub fn is_consumed(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(CacheEntry::Consumed))
    }

    pub fn insert_value(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_owned(), CacheEntry::Value(value));
    }

    pub fn mark_consumed(&mut self, key: &str) {
        self.entries.insert(key.to_owned(), CacheEntry::Consumed);
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    /// Number of cached or consumed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been cached or consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runtime-owned table of per-object caches, weakly associated by id.
#[derive(Debug, Default)]
pub(crate) struct CacheTable {
    caches: AHashMap<ObjectId, ComputedCache>,
}

impl CacheTable {
    /// The cache for `id`, created empty on first access.
    pub(crate) fn cache_for(&mut self, id: ObjectId) -> &mut ComputedCache {
        self.caches.entry(id).or_default()
    }

    /// Non-creating lookup.
    pub(crate) fn peek(&self, id: ObjectId) -> Option<&ComputedCache> {
        self.caches.get(&id)
    }

    pub(crate) fn peek_mut(&mut self, id: ObjectId) -> Option<&mut ComputedCache> {
        self.caches.get_mut(&id)
    }

    pub(crate) fn cached_entry(&self, id: ObjectId, key: &str) -> Option<&CacheEntry> {
        self.caches.get(&id).and_then(|c| c.get(key))
    }

    pub(crate) fn purge(&mut self, id: ObjectId) {
        self.caches.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_differs_from_cached_null() {
        let mut cache = ComputedCache::default();
        assert!(cache.get("k").is_none());

        cache.insert_value("k", Value::Null);
        assert_eq!(cache.get("k"), Some(&CacheEntry::Value(Value::Null)));
        assert_eq!(cache.value("k"), Some(&Value::Null));
    }

    #[test]
    fn consumed_is_not_a_value() {
        let mut cache = ComputedCache::default();
        cache.mark_consumed("k");
        assert!(cache.is_consumed("k"));
        assert!(cache.value("k").is_none());

        cache.insert_value("k", Value::from(1));
        assert!(!cache.is_consumed("k"));
        assert_eq!(cache.value("k"), Some(&Value::from(1)));
    }

    #[test]
    fn remove_returns_entry() {
        let mut cache = ComputedCache::default();
        cache.insert_value("k", Value::from(2));
        assert_eq!(cache.remove("k"), Some(CacheEntry::Value(Value::from(2))));
        assert_eq!(cache.remove("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn table_creates_on_demand_only() {
        let mut table = CacheTable::default();
        let id = ObjectId::from_raw_parts(0, 0);
        assert!(table.peek(id).is_none());
        table.cache_for(id).insert_value("k", Value::from(3));
        assert_eq!(table.peek(id).map(ComputedCache::len), Some(1));
        assert_eq!(
            table.cached_entry(id, "k"),
            Some(&CacheEntry::Value(Value::from(3)))
        );
        table.purge(id);
        assert!(table.peek(id).is_none());
    }
}
