use crate::basic_types::PropagationStatus;
use crate::propagation::Domains;
use crate::propagation::LocalId;
use crate::propagation::PropagationContext;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;
use crate::propagation::ReadDomains;
use crate::variables::IntervalSet;
use crate::variables::SetEvent;
use crate::variables::SetVarId;

/// The constructor for [`SetIncludes`]: the constant `set` must be included
/// in the set variable `a`. When `strict`, the inclusion is proper: `a` must
/// contain at least one element beyond `set`.
#[derive(Clone, Debug)]
pub struct SetIncludesArgs {
    pub set: IntervalSet,
    pub a: SetVarId,
    pub strict: bool,
}

impl PropagatorConstructor for SetIncludesArgs {
    type PropagatorImpl = SetIncludes;

    fn create(self, mut context: PropagatorConstructorContext<'_>) -> SetIncludes {
        let SetIncludesArgs { set, a, strict } = self;

        context.register_set(a, SetEvent::Any, LocalId::from(0));

        SetIncludes { set, a, strict }
    }
}

/// Propagator for `set ⊆ a` (or `set ⊂ a` when strict).
#[derive(Clone, Debug)]
pub struct SetIncludes {
    set: IntervalSet,
    a: SetVarId,
    strict: bool,
}

impl Propagator for SetIncludes {
    fn name(&self) -> &str {
        "SetIncludes"
    }

    fn queue_index(&self) -> u32 {
        0
    }

    fn propagate(&mut self, mut context: PropagationContext<'_>) -> PropagationStatus {
        let _ = context.in_glb(self.a, &self.set)?;

        if self.strict {
            let _ = context.in_cardinality(self.a, self.set.size() as i32 + 1, i32::MAX)?;
        }

        Ok(())
    }

    fn satisfied(&self, context: Domains<'_>) -> bool {
        let glb = context.set_glb(self.a);
        // Once the glb covers the set, every remaining value of `a` does;
        // strictness is entailed as soon as the glb is already larger.
        self.set.is_subset_of(glb) && (!self.strict || glb.size() > self.set.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_solver::TestSolver;

    #[test]
    fn the_set_is_forced_into_the_glb() {
        let mut solver = TestSolver::default();
        let a = solver.new_set_variable(&[1, 2, 3, 4, 5]);

        let propagator = solver
            .new_propagator(SetIncludesArgs {
                set: IntervalSet::from_values(&[1, 3]),
                a,
                strict: false,
            })
            .expect("valid model");

        assert!(solver.propagate());
        let domains = solver.store.domains();
        assert!(domains.set_glb(a).contains(1));
        assert!(domains.set_glb(a).contains(3));
        assert!(!domains.set_glb(a).contains(2));
        assert!(solver.store.satisfied(propagator));
    }

    #[test]
    fn an_element_outside_the_universe_is_a_wipeout() {
        let mut solver = TestSolver::default();
        let a = solver.new_set_variable(&[1, 2]);

        let _ = solver
            .new_propagator(SetIncludesArgs {
                set: IntervalSet::from_values(&[3]),
                a,
                strict: false,
            })
            .expect("valid model");

        assert!(!solver.propagate());
    }

    #[test]
    fn strict_inclusion_of_almost_everything_fixes_the_variable() {
        let mut solver = TestSolver::default();
        let a = solver.new_set_variable(&[1, 2, 3]);

        let _ = solver
            .new_propagator(SetIncludesArgs {
                set: IntervalSet::from_values(&[1, 2]),
                a,
                strict: true,
            })
            .expect("valid model");

        // The only proper superset of {1, 2} inside {1, 2, 3} is {1, 2, 3}.
        assert!(solver.propagate());
        let domains = solver.store.domains();
        assert!(domains.set_is_singleton(a));
        assert_eq!(3, domains.set_glb(a).size());
    }
}
