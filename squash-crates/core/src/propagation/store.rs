use std::ops::Index;
use std::ops::IndexMut;

use super::Propagator;
use super::PropagatorId;
use crate::containers::KeyedVec;

/// The owner of every imposed propagator, kept apart from the domain state so
/// that the engine can hand a propagator a context borrowing the rest of the
/// store.
#[derive(Default)]
pub(crate) struct PropagatorStore {
    propagators: KeyedVec<PropagatorId, Box<dyn Propagator>>,
}

impl PropagatorStore {
    /// The id the next pushed propagator will receive.
    pub(crate) fn next_id(&self) -> PropagatorId {
        self.propagators.next_key()
    }

    pub(crate) fn push(&mut self, propagator: Box<dyn Propagator>) -> PropagatorId {
        self.propagators.push(propagator)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &'_ mut Box<dyn Propagator>> {
        self.propagators.iter_mut()
    }
}

impl Index<PropagatorId> for PropagatorStore {
    type Output = dyn Propagator;

    fn index(&self, index: PropagatorId) -> &Self::Output {
        self.propagators[index].as_ref()
    }
}

impl IndexMut<PropagatorId> for PropagatorStore {
    fn index_mut(&mut self, index: PropagatorId) -> &mut Self::Output {
        self.propagators[index].as_mut()
    }
}

impl std::fmt::Debug for PropagatorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.propagators.iter().map(|propagator| propagator.name()))
            .finish()
    }
}
