#![cfg(test)]
//! Helpers that aid testing of propagators: a [`TestSolver`] wires up a store
//! and offers shorthand for the setups tests repeat.

use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorId;
use crate::propagation::ReadDomains;
use crate::variables::IntVarId;
use crate::variables::SetVarId;
use crate::ProtocolViolation;
use crate::Store;

#[derive(Debug, Default)]
pub(crate) struct TestSolver {
    pub(crate) store: Store,
    num_vars: u32,
}

impl TestSolver {
    pub(crate) fn new_variable(&mut self, min: i32, max: i32) -> IntVarId {
        let name = format!("x{}", self.num_vars);
        self.num_vars += 1;
        self.store.new_int_var(name, min, max).expect("fresh name")
    }

    pub(crate) fn new_set_variable(&mut self, universe: &[i32]) -> SetVarId {
        let name = format!("s{}", self.num_vars);
        self.num_vars += 1;
        self.store
            .new_set_var(name, universe)
            .expect("fresh name")
    }

    pub(crate) fn new_propagator<Constructor>(
        &mut self,
        constructor: Constructor,
    ) -> Result<PropagatorId, ProtocolViolation>
    where
        Constructor: PropagatorConstructor,
        Constructor::PropagatorImpl: 'static,
    {
        self.store.impose(constructor)
    }

    /// Runs propagation to a fixpoint; `true` means no wipeout.
    pub(crate) fn propagate(&mut self) -> bool {
        self.store.consistency()
    }

    pub(crate) fn lower_bound(&self, var: IntVarId) -> i32 {
        self.store.domains().int_min(var)
    }

    pub(crate) fn upper_bound(&self, var: IntVarId) -> i32 {
        self.store.domains().int_max(var)
    }

    pub(crate) fn assert_bounds(&self, var: IntVarId, min: i32, max: i32) {
        let actual_min = self.lower_bound(var);
        let actual_max = self.upper_bound(var);

        assert_eq!(
            (min, max),
            (actual_min, actual_max),
            "the expected bounds [{min}..{max}] did not match the actual bounds [{actual_min}..{actual_max}]"
        );
    }
}
