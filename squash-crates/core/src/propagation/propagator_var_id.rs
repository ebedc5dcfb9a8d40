use super::LocalId;
use super::PropagatorId;

/// A propagator together with the local id of one of its variables. Watch
/// lists store these so that a notification can tell the propagator *which*
/// of its variables changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PropagatorVarId {
    pub(crate) propagator: PropagatorId,
    pub(crate) variable: LocalId,
}
