use thiserror::Error;

/// The result of invoking a propagator, or of a single narrowing operation
/// composed with `?`. A propagation either succeeds or wipes out a domain;
/// the wipeout is the sole inconsistency signal and is always fatal to the
/// current search branch.
pub type PropagationStatus = Result<(), DomainWipeout>;

/// A narrowing operation would have left a variable with zero admissible
/// values. The domain itself is left untouched; the engine reports failure to
/// the search, which recovers by calling [`crate::Store::remove_level`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainWipeout;

/// A misuse of the store by the model builder or the search driver. These are
/// bugs in the caller, reported eagerly instead of being recovered from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("a variable named `{0}` already exists in the store")]
    DuplicateVariable(String),

    #[error("variable `{name}` has an empty initial domain")]
    EmptyInitialDomain { name: String },

    #[error("queue index {index} is out of range for a store with {count} queues")]
    QueueIndexOutOfRange { index: u32, count: u32 },

    #[error("variables and constraints can only be created at the root level, the store is at level {0}")]
    NotAtRootLevel(u32),
}
