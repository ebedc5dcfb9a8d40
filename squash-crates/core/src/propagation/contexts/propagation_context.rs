use std::fmt::Debug;

use crate::basic_types::DomainWipeout;
use crate::engine::DomainStore;
use crate::engine::MutableStore;
use crate::engine::StateHandle;
use crate::propagation::Domains;
#[cfg(doc)]
use crate::propagation::Propagator;
use crate::variables::IntVarId;
use crate::variables::IntervalSet;
use crate::variables::SetVarId;

/// The view of the store handed to [`Propagator::propagate`]. Domains can be
/// read through [`crate::propagation::ReadDomains`]; every mutation routes
/// through the narrowing methods here so that it is stamped, trailed, and
/// re-triggers the propagators watching the changed variable.
///
/// Each narrowing method returns whether a change actually occurred;
/// narrowing to an already-satisfied bound is a no-op. A result that would
/// empty the domain returns [`DomainWipeout`] and leaves the domain exactly
/// as it was.
#[derive(Debug)]
pub struct PropagationContext<'a> {
    pub(crate) domains: &'a mut DomainStore,
    pub(crate) state: &'a mut MutableStore,
}

impl<'a> PropagationContext<'a> {
    pub(crate) fn new(domains: &'a mut DomainStore, state: &'a mut MutableStore) -> Self {
        PropagationContext { domains, state }
    }

    /// A read-only view of the same store state.
    pub fn as_readonly(&self) -> Domains<'_> {
        Domains::new(self.domains, self.state)
    }

    pub fn reborrow(&mut self) -> PropagationContext<'_> {
        PropagationContext {
            domains: self.domains,
            state: self.state,
        }
    }
}

// Integer narrowing.
impl PropagationContext<'_> {
    /// Removes every value below `bound` from the domain of `var`.
    pub fn in_min(&mut self, var: IntVarId, bound: i32) -> Result<bool, DomainWipeout> {
        self.domains.in_min(var, bound)
    }

    /// Removes every value above `bound` from the domain of `var`.
    pub fn in_max(&mut self, var: IntVarId, bound: i32) -> Result<bool, DomainWipeout> {
        self.domains.in_max(var, bound)
    }

    /// Reduces the domain of `var` to the single value `value`.
    pub fn in_value(&mut self, var: IntVarId, value: i32) -> Result<bool, DomainWipeout> {
        self.domains.in_value(var, value)
    }

    /// Removes `value` from the domain of `var`.
    pub fn remove_value(&mut self, var: IntVarId, value: i32) -> Result<bool, DomainWipeout> {
        self.domains.remove_value(var, value)
    }
}

// Set narrowing.
impl PropagationContext<'_> {
    /// Adds `set` to the guaranteed-included subset of `var`.
    pub fn in_glb(&mut self, var: SetVarId, set: &IntervalSet) -> Result<bool, DomainWipeout> {
        self.domains.in_glb(var, set)
    }

    /// Intersects the maximal-possible superset of `var` with `set`.
    pub fn in_lub(&mut self, var: SetVarId, set: &IntervalSet) -> Result<bool, DomainWipeout> {
        self.domains.in_lub(var, set)
    }

    /// Removes `value` from the maximal-possible superset of `var`.
    pub fn in_lub_complement(
        &mut self,
        var: SetVarId,
        value: i32,
    ) -> Result<bool, DomainWipeout> {
        self.domains.in_lub_complement(var, value)
    }

    /// Tightens the cardinality interval of `var` to `[min, max]`.
    pub fn in_cardinality(
        &mut self,
        var: SetVarId,
        min: i32,
        max: i32,
    ) -> Result<bool, DomainWipeout> {
        self.domains.in_cardinality(var, min, max)
    }
}

// Registry state.
impl PropagationContext<'_> {
    /// Overwrites the value of a registry slot. The previous value is pushed
    /// onto the slot's history if this is the first write at the current
    /// level, and overwritten in place otherwise.
    pub fn update_state<T: Clone + Debug + 'static>(&mut self, handle: StateHandle<T>, value: T) {
        let level = self.domains.level();
        self.state.update(handle, value, level);
    }
}
