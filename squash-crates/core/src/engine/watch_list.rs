use enum_map::EnumMap;
use fnv::FnvHashMap;

use crate::containers::KeyedVec;
use crate::propagation::PropagatorId;
use crate::propagation::PropagatorVarId;
use crate::variables::IntEvent;
use crate::variables::IntVarId;
use crate::variables::SetEvent;
use crate::variables::SetVarId;

/// Per-variable watcher lists, one list per pruning-event category. A
/// propagator appears in exactly one category list per variable it watches;
/// an event wakes every list in its [`IntEvent::wakes`] set.
///
/// Separately, the watched-propagator side channel is consulted on every
/// `Ground` event of an integer variable, regardless of category lists. It is
/// the fast path for propagators over large Boolean-like scopes which only
/// care about variables becoming fixed.
#[derive(Debug, Default)]
pub(crate) struct WatchList {
    int_watchers: KeyedVec<IntVarId, EnumMap<IntEvent, Vec<PropagatorVarId>>>,
    set_watchers: KeyedVec<SetVarId, EnumMap<SetEvent, Vec<PropagatorVarId>>>,
    watched: FnvHashMap<IntVarId, Vec<PropagatorId>>,
}

impl WatchList {
    pub(crate) fn grow_int(&mut self) {
        let _ = self.int_watchers.push(EnumMap::default());
    }

    pub(crate) fn grow_set(&mut self) {
        let _ = self.set_watchers.push(EnumMap::default());
    }

    pub(crate) fn watch_int(
        &mut self,
        var: IntVarId,
        category: IntEvent,
        watcher: PropagatorVarId,
    ) {
        self.int_watchers[var][category].push(watcher);
    }

    pub(crate) fn watch_set(
        &mut self,
        var: SetVarId,
        category: SetEvent,
        watcher: PropagatorVarId,
    ) {
        self.set_watchers[var][category].push(watcher);
    }

    pub(crate) fn int_watchers(&self, var: IntVarId, category: IntEvent) -> &[PropagatorVarId] {
        &self.int_watchers[var][category]
    }

    pub(crate) fn set_watchers(&self, var: SetVarId, category: SetEvent) -> &[PropagatorVarId] {
        &self.set_watchers[var][category]
    }

    /// Registers `propagator` on the side channel of `var`: it will be
    /// enqueued whenever `var` becomes singleton, bypassing the category
    /// lists.
    pub(crate) fn register_watched(&mut self, var: IntVarId, propagator: PropagatorId) {
        let watchers = self.watched.entry(var).or_default();
        if !watchers.contains(&propagator) {
            watchers.push(propagator);
        }
    }

    pub(crate) fn deregister_watched(&mut self, var: IntVarId, propagator: PropagatorId) {
        if let Some(watchers) = self.watched.get_mut(&var) {
            watchers.retain(|&watcher| watcher != propagator);
        }
    }

    pub(crate) fn watched(&self, var: IntVarId) -> &[PropagatorId] {
        self.watched
            .get(&var)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Strips every registration of `propagator`. Used when an imposition is
    /// rejected after the constructor already registered interest.
    pub(crate) fn remove_propagator(&mut self, propagator: PropagatorId) {
        for watchers in self.int_watchers.iter_mut() {
            for (_, list) in watchers.iter_mut() {
                list.retain(|watcher| watcher.propagator != propagator);
            }
        }
        for watchers in self.set_watchers.iter_mut() {
            for (_, list) in watchers.iter_mut() {
                list.retain(|watcher| watcher.propagator != propagator);
            }
        }
        for watchers in self.watched.values_mut() {
            watchers.retain(|&watcher| watcher != propagator);
        }
    }
}
