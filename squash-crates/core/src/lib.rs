//! The core of the Squash constraint solver: a propagation-and-backtracking
//! engine over finite-domain variables.
//!
//! A [`Store`] owns variables (integer and set valued), the trail that makes
//! their domains restorable, a registry of backtrackable propagator state, and
//! the queues which drive constraint propagation to a fixpoint. Search is
//! external: a search procedure opens a level with [`Store::set_level`], posts
//! decisions through the narrowing API, calls [`Store::consistency`], and on
//! failure undoes the layer with [`Store::remove_level`].

pub(crate) mod basic_types;
pub mod containers;
pub mod engine;
pub mod propagation;
pub mod propagators;
pub(crate) mod squash_asserts;
pub mod variables;

pub use basic_types::DomainWipeout;
pub use basic_types::PropagationStatus;
pub use basic_types::ProtocolViolation;
pub use engine::Store;
pub use engine::StoreConfig;
