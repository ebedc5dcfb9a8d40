use std::fmt::Debug;

use super::LocalId;
use super::Propagator;
use super::PropagatorId;
use super::PropagatorVarId;
use crate::engine::DomainStore;
use crate::engine::MutableStore;
use crate::engine::StateHandle;
use crate::engine::WatchList;
use crate::variables::IntEvent;
use crate::variables::IntVarId;
use crate::variables::SetEvent;
use crate::variables::SetVarId;

/// A propagator constructor creates a fully initialized instance of a
/// [`Propagator`] when the constraint is imposed on a store.
///
/// The constructor is responsible for declaring the propagator's scope by
/// registering the pruning events it wants to be scheduled on, and for
/// seeding any backtrackable state with values derived from the current
/// domains.
pub trait PropagatorConstructor {
    /// The propagator that is produced by this constructor.
    type PropagatorImpl: Propagator;

    /// Create the propagator instance from `Self`.
    fn create(self, context: PropagatorConstructorContext<'_>) -> Self::PropagatorImpl;
}

/// The communication point between the store and a [`PropagatorConstructor`].
/// Registrations name the constructed propagator through the id reserved for
/// it before [`PropagatorConstructor::create`] runs.
#[derive(Debug)]
pub struct PropagatorConstructorContext<'a> {
    pub(crate) watch_list: &'a mut WatchList,
    pub(crate) domains: &'a DomainStore,
    pub(crate) state: &'a mut MutableStore,
    pub(crate) remove_level_listeners: &'a mut Vec<PropagatorId>,
    pub(crate) propagator_id: PropagatorId,
}

impl PropagatorConstructorContext<'_> {
    /// Subscribes the propagator to pruning events of `var` at the given
    /// category: it is woken whenever an event whose
    /// [`IntEvent::wakes`] set contains `category` occurs.
    ///
    /// The [`LocalId`] identifies the variable within the propagator when
    /// [`Propagator::notify`] is called. Each registered variable *must*
    /// have a unique [`LocalId`].
    pub fn register_int(&mut self, var: IntVarId, category: IntEvent, local_id: LocalId) {
        let watcher = PropagatorVarId {
            propagator: self.propagator_id,
            variable: local_id,
        };
        self.watch_list.watch_int(var, category, watcher);
    }

    /// Subscribes the propagator to pruning events of the set variable `var`
    /// at the given category. See [`Self::register_int`].
    pub fn register_set(&mut self, var: SetVarId, category: SetEvent, local_id: LocalId) {
        let watcher = PropagatorVarId {
            propagator: self.propagator_id,
            variable: local_id,
        };
        self.watch_list.watch_set(var, category, watcher);
    }

    /// Places the propagator on the watched side channel of `var`: it is
    /// enqueued whenever `var` becomes singleton, independent of the
    /// category lists and without a [`Propagator::notify`] call.
    pub fn register_watched(&mut self, var: IntVarId) {
        self.watch_list.register_watched(var, self.propagator_id);
    }

    /// Asks the store to call [`Propagator::on_remove_level`] before levels
    /// are undone during backtracking.
    pub fn register_remove_level_listener(&mut self) {
        if !self.remove_level_listeners.contains(&self.propagator_id) {
            self.remove_level_listeners.push(self.propagator_id);
        }
    }

    /// Allocates a registry slot holding `value`, restored automatically on
    /// backtracking. The returned handle is the only way to reach the slot.
    pub fn new_state<T: Clone + Debug + 'static>(&mut self, value: T) -> StateHandle<T> {
        self.state.alloc(value)
    }
}
