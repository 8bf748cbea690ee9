#![forbid(unsafe_code)]

//! Generational slot heap for the dynamic object graph.
//!
//! Objects live in a slab of slots addressed by [`ObjectId`]. Freeing a slot
//! bumps its generation, so every outstanding id for it goes permanently
//! stale — the side tables keyed by id (meta, caches, observers) never
//! resurrect a recycled object.

use ahash::AHashMap;
use tether_core::{ObjectId, Value};

/// Storage shape of one heap object.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectBody {
    /// Named properties.
    Map(AHashMap<String, Value>),
    /// An ordered collection, addressable by `@each` chains.
    List(Vec<Value>),
}

impl ObjectBody {
    /// True for [`ObjectBody::List`].
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, ObjectBody::List(_))
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    body: Option<ObjectBody>,
}

/// The object heap. One per runtime.
#[derive(Debug, Default)]
pub(crate) struct ObjectHeap {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ObjectHeap {
    pub(crate) fn alloc(&mut self, body: ObjectBody) -> ObjectId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            ObjectId::from_raw_parts(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).expect("heap exceeds u32 slots");
            self.slots.push(Slot {
                generation: 0,
                body: Some(body),
            });
            ObjectId::from_raw_parts(index, 0)
        }
    }

    pub(crate) fn contains(&self, id: ObjectId) -> bool {
        self.slot(id).is_some()
    }

    pub(crate) fn body(&self, id: ObjectId) -> Option<&ObjectBody> {
        self.slot(id).and_then(|s| s.body.as_ref())
    }

    pub(crate) fn body_mut(&mut self, id: ObjectId) -> Option<&mut ObjectBody> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.body.as_mut()
    }

    /// Free the slot, invalidating every outstanding id for it.
    /// Returns false if the id was already stale.
    pub(crate) fn free(&mut self, id: ObjectId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index() as usize) else {
            return false;
        };
        if slot.generation != id.generation() || slot.body.is_none() {
            return false;
        }
        slot.body = None;
        slot.generation += 1;
        self.free.push(id.index());
        true
    }

    /// Number of live objects.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn slot(&self, id: ObjectId) -> Option<&Slot> {
        self.slots
            .get(id.index() as usize)
            .filter(|s| s.generation == id.generation() && s.body.is_some())
    }
}
