#![forbid(unsafe_code)]

//! The active-observer registry and its revalidation sweep.
//!
//! Observers are pull-based: registering one resolves the observed path to a
//! chain tag and snapshots its value; nothing happens at mutation time beyond
//! the ordinary tag dirtying. The periodic [`sweep`](Runtime::sweep) compares
//! every stored snapshot against the live tag, dispatches a change event for
//! each stale entry, then re-resolves and re-baselines it. No mutation
//! between two sweeps means the second one dispatches nothing.
//!
//! # Entry lifecycle
//!
//! absent → active(count=1) → … → active(count=N) → … → absent. Activation
//! increments or creates; deactivation decrements and deletes at zero.
//! Deactivating an absent entry is a no-op. Entries for destroyed targets
//! are purged wholesale during the sweep and never notify again.

use indexmap::IndexMap;
use tether_core::{Error, ObjectId, Path, Result, Revision, Tag};
use tracing::debug;

use crate::events::ListenerId;
use crate::runtime::Runtime;

/// The change-event topic for an observed path.
#[must_use]
pub fn change_event(path: &str) -> String {
    format!("{path}:change")
}

/// Handle pairing an observer's listener registration with its activation,
/// needed to remove the observer again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObserverHandle {
    pub(crate) listener: ListenerId,
}

#[derive(Debug)]
pub(crate) struct ActiveObserver {
    count: usize,
    path: Path,
    tag: Tag,
    last_revision: Revision,
}

/// All active observers, indexed by target then event name. `IndexMap` keeps
/// sweep order deterministic.
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    targets: IndexMap<ObjectId, IndexMap<String, ActiveObserver>>,
}

impl ObserverRegistry {
    fn increment(&mut self, obj: ObjectId, event: &str) -> bool {
        if let Some(entry) = self.targets.get_mut(&obj).and_then(|m| m.get_mut(event)) {
            entry.count += 1;
            return true;
        }
        false
    }

    fn insert(&mut self, obj: ObjectId, event: &str, entry: ActiveObserver) {
        self.targets
            .entry(obj)
            .or_default()
            .insert(event.to_owned(), entry);
    }

    /// Decrement and delete at zero. Absent entries are left alone.
    fn decrement(&mut self, obj: ObjectId, event: &str) {
        let Some(observers) = self.targets.get_mut(&obj) else {
            return;
        };
        let Some(entry) = observers.get_mut(event) else {
            return;
        };
        entry.count -= 1;
        if entry.count == 0 {
            observers.shift_remove(event);
            if observers.is_empty() {
                self.targets.shift_remove(&obj);
            }
        }
    }

    pub(crate) fn contains(&self, obj: ObjectId, event: &str) -> bool {
        self.targets
            .get(&obj)
            .is_some_and(|m| m.contains_key(event))
    }

    pub(crate) fn count(&self, obj: ObjectId, event: &str) -> usize {
        self.targets
            .get(&obj)
            .and_then(|m| m.get(event))
            .map_or(0, |entry| entry.count)
    }

    fn path_of(&self, obj: ObjectId, event: &str) -> Option<Path> {
        self.targets
            .get(&obj)
            .and_then(|m| m.get(event))
            .map(|entry| entry.path.clone())
    }

    fn rebaseline(&mut self, obj: ObjectId, event: &str, tag: Tag, last_revision: Revision) {
        if let Some(entry) = self.targets.get_mut(&obj).and_then(|m| m.get_mut(event)) {
            entry.tag = tag;
            entry.last_revision = last_revision;
        }
    }

    pub(crate) fn purge(&mut self, obj: ObjectId) {
        self.targets.shift_remove(&obj);
    }

    pub(crate) fn target_count(&self) -> usize {
        self.targets.len()
    }
}

impl Runtime {
    /// Observe `path` on `obj`: register `callback` for the path's change
    /// event and activate revalidation tracking.
    pub fn add_observer(
        &mut self,
        obj: ObjectId,
        path: &str,
        callback: impl Fn(&mut Runtime, ObjectId, &str) + 'static,
    ) -> Result<ObserverHandle> {
        if self.is_destroyed(obj) {
            return Err(Error::Destroyed { target: obj });
        }
        let parsed: Path = path.parse()?;
        let event = change_event(path);
        let listener = self.add_listener(obj, &event, callback);
        self.activate_observer(obj, &event, parsed);
        Ok(ObserverHandle { listener })
    }

    /// Remove one activation of `path` on `obj` and its listener. Removing
    /// an observer that is already gone is a no-op.
    pub fn remove_observer(&mut self, obj: ObjectId, path: &str, handle: ObserverHandle) {
        let event = change_event(path);
        self.deactivate_observer(obj, &event);
        self.remove_listener(obj, &event, handle.listener);
    }

    /// Number of activations for `path` on `obj`.
    #[must_use]
    pub fn observer_count(&self, obj: ObjectId, path: &str) -> usize {
        self.observers.count(obj, &change_event(path))
    }

    fn activate_observer(&mut self, obj: ObjectId, event: &str, path: Path) {
        if self.observers.increment(obj, event) {
            return;
        }
        let tag = self.chain_tag(obj, &path);
        let last_revision = tag.value();
        self.observers.insert(
            obj,
            event,
            ActiveObserver {
                count: 1,
                path,
                tag,
                last_revision,
            },
        );
    }

    fn deactivate_observer(&mut self, obj: ObjectId, event: &str) {
        self.observers.decrement(obj, event);
    }

    /// Revalidate every active observer, dispatching a change event for each
    /// stale one and re-baselining it; purge entries — and every other side
    /// table — for destroyed objects.
    ///
    /// Idempotent: a second sweep with no intervening mutation dispatches
    /// nothing.
    pub fn sweep(&mut self) {
        let mut dead: Vec<ObjectId> = Vec::new();
        let mut stale: Vec<(ObjectId, String)> = Vec::new();
        for (&target, observers) in &self.observers.targets {
            if self.is_destroyed(target) {
                dead.push(target);
                continue;
            }
            for (event, entry) in observers {
                if !entry.tag.validate(entry.last_revision) {
                    stale.push((target, event.clone()));
                }
            }
        }

        // destroyed targets never notify again
        for &target in &dead {
            self.purge_object(target);
        }

        let mut notified = 0usize;
        for (target, event) in stale {
            // a listener earlier in this sweep may have destroyed or
            // deactivated this entry
            if self.is_destroyed(target) || !self.observers.contains(target, &event) {
                continue;
            }
            self.dispatch_change(target, &event);
            notified += 1;

            let Some(path) = self.observers.path_of(target, &event) else {
                continue;
            };
            let tag = self.chain_tag(target, &path);
            let last_revision = tag.value();
            self.observers.rebaseline(target, &event, tag, last_revision);
        }

        // backstop: reclaim side tables of anything destroyed but never
        // observed (or destroyed by a listener just now)
        self.collect_destroyed();

        debug!(
            target: "tether::observer",
            notified,
            purged = dead.len(),
            targets = self.observers.target_count(),
            "sweep complete"
        );
    }
}
