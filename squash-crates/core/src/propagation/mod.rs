//! The building blocks for propagators.
//!
//! A propagator takes a set of variables with their current domains and
//! narrows the domains to a subset; it may detect that no assignment can
//! satisfy its constraint, which it reports as a [`crate::DomainWipeout`].
//!
//! Each concrete propagator implements the [`Propagator`] trait; its
//! [`Propagator::propagate`] routine performs the narrowing through a
//! [`PropagationContext`]. A propagator is created by a
//! [`PropagatorConstructor`], which is responsible for registering the
//! pruning events the propagator wants to be scheduled on (this registration
//! is the declaration of the propagator's scope) and for allocating any
//! backtrackable state the propagator keeps.
//!
//! Propagators are not required to be idempotent in a single call, but
//! [`Propagator::propagate`] must reach its own fixpoint before returning:
//! the engine never re-queues the propagator for changes it made itself.
//! Re-invocation with unchanged domains must narrow nothing.

mod constructor;
mod contexts;
mod domains;
mod local_id;
mod propagator;
pub(crate) mod propagator_id;
mod propagator_var_id;
pub(crate) mod store;

pub use constructor::PropagatorConstructor;
pub use constructor::PropagatorConstructorContext;
pub use contexts::PropagationContext;
pub use domains::Domains;
pub use domains::ReadDomains;
pub use local_id::LocalId;
pub use propagator::EnqueueDecision;
pub use propagator::Propagator;
pub use propagator_id::PropagatorId;
pub(crate) use propagator_var_id::PropagatorVarId;
