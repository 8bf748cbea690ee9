#![forbid(unsafe_code)]

//! The lazy dependency-chain walker.
//!
//! `chain_tag` turns a dotted path into one combined [`Tag`] by walking the
//! live object graph segment by segment, collecting each slot's property tag
//! along the way. The walk never forces a computation: a derived segment
//! whose memoized value is stale gets an updatable *placeholder* tag parked
//! in the stalled object's lazy-chain list instead, and the next write of
//! that key redirects the placeholder onto the freshly-walkable remainder.
//! Callers holding the original combined tag observe the completed chain
//! retroactively, without re-requesting anything.
//!
//! # Invariants
//!
//! 1. A freshly resolved chain tag validates its own `value()`.
//! 2. Mutating any property along the resolved chain invalidates the tag;
//!    mutating properties off the chain does not.
//! 3. At most one placeholder is pending per (stalled key, remaining suffix).
//! 4. Resolution is against whatever is live *now* — there is no snapshot
//!    isolation across segments.
//!
//! # Walk policy
//!
//! - Primitives end the chain; unreached segments contribute no tag.
//! - A stale derived segment with nothing after it just ends the walk — the
//!   walker never recomputes, only the real get/set path does.
//! - `@each` over a value that is not currently a collection degrades to a
//!   primitive-style stop: the stem's own tag already covers the value being
//!   replaced with a real collection later.

use tether_core::{ObjectId, Path, Result, Revision, Tag, Value};
use tracing::trace;

use crate::cache::CacheEntry;
use crate::descriptor::Descriptor;
use crate::heap::ObjectBody;
use crate::runtime::Runtime;

/// The pseudo-property tagging a collection's membership. Dirtied by every
/// element addition, removal, or replacement.
pub const CONTENT_KEY: &str = "[]";

impl Runtime {
    /// Resolve the combined invalidation tag for `path` rooted at `obj`.
    pub fn chain_tag(&mut self, obj: ObjectId, path: &Path) -> Tag {
        let mut tags: Vec<Tag> = Vec::new();
        let mut current = obj;
        let stems = path.stems();

        for (walked, segment) in stems.iter().enumerate() {
            let property_tag = self.tag_for_property(current, segment);
            tags.push(property_tag.clone());

            let Some(descriptor) = self.descriptor_for(current, segment) else {
                // plain field: advance through the live value
                match self.peek_property(current, segment).as_object() {
                    Some(next) => current = next,
                    None => return Tag::combine(tags),
                }
                continue;
            };

            let last = self
                .last_revision_for(current, segment)
                .unwrap_or(Revision::CONSTANT);
            if property_tag.validate(last) {
                let cached = match (&descriptor, self.peek_cache_entry(current, segment)) {
                    (Descriptor::Computed(_), Some(CacheEntry::Value(v))) => Some(v.clone()),
                    // aliases forward live, and a validated-but-uncached
                    // computed falls back to a live read
                    _ => None,
                };
                let next = match cached {
                    Some(value) => value,
                    None => self.untracked(|rt| rt.get(current, segment)),
                };
                match next.as_object() {
                    Some(next) => current = next,
                    None => return Tag::combine(tags),
                }
            } else {
                // Stale derived segment: walking further would recompute on
                // the walker's behalf. Park the remainder; the next write of
                // this key picks it up.
                if walked + 1 < stems.len() || path.each_key().is_some() {
                    let suffix = path.suffix(walked + 1);
                    let placeholder = self
                        .meta_for(current)
                        .lazy_placeholder(segment, &suffix);
                    trace!(
                        target: "tether::chains",
                        object = %current,
                        key = %segment,
                        suffix = %suffix,
                        "chain stalled; placeholder parked"
                    );
                    tags.push(placeholder);
                }
                return Tag::combine(tags);
            }
        }

        if let Some(each_key) = path.each_key() {
            if let Some(ObjectBody::List(items)) = self.peek_body(current) {
                let elements: Vec<ObjectId> =
                    items.iter().filter_map(Value::as_object).collect();
                for element in elements {
                    let tag = self.tag_for_property(element, each_key);
                    tags.push(tag);
                }
                // membership changes must invalidate even when no element
                // property did
                let content = self.tag_for_property(current, CONTENT_KEY);
                tags.push(content);
            }
        }

        Tag::combine(tags)
    }

    /// Parse `path` and resolve its chain tag.
    pub fn chain_tag_str(&mut self, obj: ObjectId, path: &str) -> Result<Tag> {
        let parsed: Path = path.parse()?;
        Ok(self.chain_tag(obj, &parsed))
    }

    /// Combined chain tag over several paths, as used by computed
    /// dependent-key declarations.
    pub(crate) fn chain_tags_for_keys(&mut self, obj: ObjectId, paths: &[Path]) -> Tag {
        let mut tags = Vec::with_capacity(paths.len());
        for path in paths {
            tags.push(self.chain_tag(obj, path));
        }
        Tag::combine(tags)
    }

    /// Complete (or discard) chains parked at `(obj, key)`, now that the
    /// key's value changed to `new_value`. Called from every write path.
    pub fn finish_lazy_chains(&mut self, obj: ObjectId, key: &str, new_value: &Value) {
        let Some(pending) = self
            .peek_meta_mut(obj)
            .and_then(|meta| meta.take_lazy_chains(key))
        else {
            return;
        };
        match new_value.as_object() {
            // the chain can never complete through a primitive
            None => {
                trace!(
                    target: "tether::chains",
                    object = %obj,
                    key = %key,
                    discarded = pending.len(),
                    "lazy chains cleared"
                );
            }
            Some(next) => {
                for (suffix, placeholder) in pending {
                    let resolved = self.chain_tag(next, &suffix);
                    placeholder.redirect_to(&resolved);
                }
            }
        }
    }
}
