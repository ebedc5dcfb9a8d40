use downcast_rs::impl_downcast;
use downcast_rs::Downcast;

use super::Domains;
use super::LocalId;
use super::PropagationContext;
use crate::basic_types::PropagationStatus;
use crate::variables::PruningEvent;

// Diagnostics (and tests) occasionally need to recover a concrete propagator
// from a `Box<dyn Propagator>`; rust does not allow downcasting from the
// trait definition to its concrete type.
impl_downcast!(Propagator);

/// A propagator removes values from domains which will never be in any
/// solution, or detects that no solution exists in the current branch.
///
/// The only required functions are [`Propagator::name`] and
/// [`Propagator::propagate`]; all other functions have default
/// implementations. A mature propagator usually also implements
/// [`Propagator::notify`] to maintain incremental state and skip useless
/// invocations, and [`Propagator::queue_index`] to place itself correctly
/// relative to cheaper or stronger propagators.
pub trait Propagator: Downcast {
    /// The name of the propagator, used for logging and diagnostics.
    fn name(&self) -> &str;

    /// The index of the queue this propagator is scheduled on, fixed for its
    /// lifetime. Queues with lower indices are emptied first, so cheap
    /// propagators with strong pruning belong in low queues. The index must
    /// be below the queue count the store was configured with.
    fn queue_index(&self) -> u32 {
        3
    }

    /// Narrows the domains of the variables in this propagator's scope given
    /// their current state. All narrowing goes through `context` so it is
    /// trailed and re-triggers dependent propagators.
    ///
    /// The engine does not re-queue a propagator for changes it made itself:
    /// this routine must reach its own fixpoint before returning. When no
    /// variable in scope changed since the last invocation, calling this
    /// again must narrow nothing.
    fn propagate(&mut self, context: PropagationContext<'_>) -> PropagationStatus;

    /// Called when a pruning event the propagator registered for occurs on
    /// the variable with the given [`LocalId`]. This can be used to maintain
    /// incremental data structures, and to decide whether being scheduled is
    /// worthwhile at all; only computationally cheap logic belongs here.
    ///
    /// This is also invoked for the propagator's own pruning (which does not
    /// re-queue it), so incremental state stays in step with the domains.
    fn notify(
        &mut self,
        _context: Domains<'_>,
        _local_id: LocalId,
        _event: PruningEvent,
    ) -> EnqueueDecision {
        EnqueueDecision::Enqueue
    }

    /// A pure entailment check: `true` only when the constraint holds under
    /// every remaining assignment of its scope, regardless of further
    /// narrowing. The engine treats this as advisory.
    fn satisfied(&self, _context: Domains<'_>) -> bool {
        false
    }

    /// Called exactly once when this propagator is the one that raised a
    /// domain wipeout, strictly before the failure is reported to the caller
    /// of [`crate::Store::consistency`]. Intended for decaying weights and
    /// similar heuristics, never for correctness.
    fn clean_after_failure(&mut self) {}

    /// Called before the store undoes the levels at or above `level`, while
    /// old incremental state is still readable. Only invoked for propagators
    /// registered through
    /// [`super::PropagatorConstructorContext::register_remove_level_listener`].
    fn on_remove_level(&mut self, _level: u32) {}

    /// Called after backtracking has restored domains and registry state,
    /// allowing the propagator to resynchronise anything it keeps outside
    /// the registry.
    fn synchronise(&mut self, _context: Domains<'_>) {}
}

/// Indicator of what to do when a propagator is notified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnqueueDecision {
    /// The propagator should be enqueued.
    Enqueue,
    /// The propagator should not be enqueued.
    Skip,
}
