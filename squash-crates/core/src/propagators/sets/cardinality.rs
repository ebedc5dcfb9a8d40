use crate::basic_types::PropagationStatus;
use crate::propagation::Domains;
use crate::propagation::LocalId;
use crate::propagation::PropagationContext;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;
use crate::propagation::ReadDomains;
use crate::variables::SetEvent;
use crate::variables::SetVarId;

/// The constructor for [`SetCardinality`]: the number of elements of the set
/// variable `a` lies in `[min, max]`.
#[derive(Clone, Copy, Debug)]
pub struct SetCardinalityArgs {
    pub a: SetVarId,
    pub min: i32,
    pub max: i32,
}

impl PropagatorConstructor for SetCardinalityArgs {
    type PropagatorImpl = SetCardinality;

    fn create(self, mut context: PropagatorConstructorContext<'_>) -> SetCardinality {
        let SetCardinalityArgs { a, min, max } = self;

        context.register_set(a, SetEvent::Any, LocalId::from(0));

        SetCardinality { a, min, max }
    }
}

/// Propagator for `|a| ∈ [min, max]`.
///
/// Tightening the cardinality bracket is enough: the domain itself collapses
/// the glb/lub bracket when a cardinality bound meets a bracket size.
#[derive(Clone, Copy, Debug)]
pub struct SetCardinality {
    a: SetVarId,
    min: i32,
    max: i32,
}

impl Propagator for SetCardinality {
    fn name(&self) -> &str {
        "SetCardinality"
    }

    fn queue_index(&self) -> u32 {
        0
    }

    fn propagate(&mut self, mut context: PropagationContext<'_>) -> PropagationStatus {
        let _ = context.in_cardinality(self.a, self.min, self.max)?;
        Ok(())
    }

    fn satisfied(&self, context: Domains<'_>) -> bool {
        let size = context.set_glb(self.a).size() as i32;
        context.set_is_singleton(self.a) && self.min <= size && size <= self.max
    }
}
