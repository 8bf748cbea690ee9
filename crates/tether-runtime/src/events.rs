#![forbid(unsafe_code)]

//! The change-event listener bus.
//!
//! Fire-and-forget dispatch of `(target, event)` notifications to registered
//! callbacks. Removal is by [`ListenerId`] — closures have no identity of
//! their own, so registration hands back a handle. Callbacks receive the
//! runtime mutably and may re-enter it freely; dispatch clones the callback
//! list first, so listeners added or removed mid-dispatch take effect on the
//! next event.

use std::rc::Rc;

use ahash::AHashMap;
use tether_core::ObjectId;

use crate::runtime::Runtime;

/// Callback invoked when a change event fires.
pub type ListenerFn = Rc<dyn Fn(&mut Runtime, ObjectId, &str)>;

/// Handle for removing a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    callback: ListenerFn,
}

/// Per-(object, event) listener registry.
#[derive(Default)]
pub(crate) struct ListenerBus {
    topics: AHashMap<ObjectId, AHashMap<String, Vec<ListenerEntry>>>,
    next_id: u64,
}

impl ListenerBus {
    pub(crate) fn add(&mut self, obj: ObjectId, event: &str, callback: ListenerFn) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.topics
            .entry(obj)
            .or_default()
            .entry(event.to_owned())
            .or_default()
            .push(ListenerEntry { id, callback });
        id
    }

    pub(crate) fn remove(&mut self, obj: ObjectId, event: &str, id: ListenerId) -> bool {
        let Some(events) = self.topics.get_mut(&obj) else {
            return false;
        };
        let Some(entries) = events.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() < before;
        if entries.is_empty() {
            events.remove(event);
            if events.is_empty() {
                self.topics.remove(&obj);
            }
        }
        removed
    }

    pub(crate) fn callbacks(&self, obj: ObjectId, event: &str) -> Vec<ListenerFn> {
        self.topics
            .get(&obj)
            .and_then(|events| events.get(event))
            .map(|entries| entries.iter().map(|e| Rc::clone(&e.callback)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn purge_object(&mut self, obj: ObjectId) {
        self.topics.remove(&obj);
    }
}

impl std::fmt::Debug for ListenerBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerBus")
            .field("objects", &self.topics.len())
            .finish()
    }
}

impl Runtime {
    /// Register a callback for `event` on `obj`.
    pub fn add_listener(
        &mut self,
        obj: ObjectId,
        event: &str,
        callback: impl Fn(&mut Runtime, ObjectId, &str) + 'static,
    ) -> ListenerId {
        self.bus.add(obj, event, Rc::new(callback))
    }

    /// Remove a previously registered callback. Returns false if it was
    /// already gone.
    pub fn remove_listener(&mut self, obj: ObjectId, event: &str, id: ListenerId) -> bool {
        self.bus.remove(obj, event, id)
    }

    /// Notify every listener of `(obj, event)`. Fire-and-forget: no return
    /// value, and listener re-entry is allowed.
    pub fn dispatch_change(&mut self, obj: ObjectId, event: &str) {
        let callbacks = self.bus.callbacks(obj, event);
        for callback in callbacks {
            callback(self, obj, event);
        }
    }
}
