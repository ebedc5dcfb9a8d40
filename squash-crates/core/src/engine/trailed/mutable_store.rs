use std::fmt::Debug;
use std::marker::PhantomData;

use downcast_rs::impl_downcast;
use downcast_rs::Downcast;

use super::TimeStamp;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;

/// A slot in the registry that the store can roll back without knowing the
/// concrete value type.
pub(crate) trait Stateful: Downcast + Debug {
    fn remove_level(&mut self, level: u32);
}

impl_downcast!(Stateful);

impl<T: Clone + Debug + 'static> Stateful for TimeStamp<T> {
    fn remove_level(&mut self, level: u32) {
        self.remove_level(level);
    }
}

/// The index of a registry slot.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct StateId(u32);

impl StorageKey for StateId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        StateId(index as u32)
    }
}

/// A typed handle to a registry slot. The propagator that allocated the slot
/// keeps the handle; the slot itself lives in the store so that it is rolled
/// back on backtracking along with everything else.
#[derive(Debug)]
pub struct StateHandle<T> {
    id: StateId,
    value: PhantomData<fn() -> T>,
}

impl<T> Clone for StateHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateHandle<T> {}

/// The registry of versioned propagator state. Slots are allocated through
/// [`crate::propagation::PropagatorConstructorContext::new_state`] and read or
/// updated through the propagation contexts; the store rolls every slot back
/// on [`crate::Store::remove_level`] *before* undoing variable domains, so a
/// propagator observing restored domains always observes restored private
/// state as well.
#[derive(Debug, Default)]
pub struct MutableStore {
    slots: KeyedVec<StateId, Box<dyn Stateful>>,
}

impl MutableStore {
    pub(crate) fn alloc<T: Clone + Debug + 'static>(&mut self, value: T) -> StateHandle<T> {
        let id = self.slots.push(Box::new(TimeStamp::new(value)));
        StateHandle {
            id,
            value: PhantomData,
        }
    }

    pub(crate) fn value<T: Clone + Debug + 'static>(&self, handle: StateHandle<T>) -> &T {
        self.slot(handle).value()
    }

    pub(crate) fn stamp<T: Clone + Debug + 'static>(&self, handle: StateHandle<T>) -> u32 {
        self.slot(handle).stamp()
    }

    pub(crate) fn update<T: Clone + Debug + 'static>(
        &mut self,
        handle: StateHandle<T>,
        value: T,
        level: u32,
    ) {
        self.slots[handle.id]
            .downcast_mut::<TimeStamp<T>>()
            .expect("a state handle is only created for a slot of its own type")
            .update(value, level);
    }

    pub(crate) fn remove_level(&mut self, level: u32) {
        for slot in self.slots.iter_mut() {
            slot.remove_level(level);
        }
    }

    fn slot<T: Clone + Debug + 'static>(&self, handle: StateHandle<T>) -> &TimeStamp<T> {
        self.slots[handle.id]
            .downcast_ref::<TimeStamp<T>>()
            .expect("a state handle is only created for a slot of its own type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_roll_back_independently() {
        let mut store = MutableStore::default();
        let counter = store.alloc(0_i64);
        let tags = store.alloc(vec![0_u32]);

        store.update(counter, 5, 1);
        store.update(tags, vec![1, 2], 2);

        store.remove_level(2);
        assert_eq!(5, *store.value(counter));
        assert_eq!(vec![0], *store.value(tags));

        store.remove_level(1);
        assert_eq!(0, *store.value(counter));
    }
}
