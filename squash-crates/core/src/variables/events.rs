use enum_map::Enum;
use enumset::EnumSet;
use enumset::EnumSetType;

/// The category of a pruning event on an integer variable. Watchers register
/// at a single category; an event wakes every watcher whose category is in
/// [`IntEvent::wakes`].
#[derive(EnumSetType, Enum, Debug, Hash)]
pub enum IntEvent {
    /// The domain collapsed to a single value.
    Ground,
    /// The lower or upper bound was tightened.
    Bound,
    /// Any change, including a hole punched strictly inside the bounds.
    Any,
}

impl IntEvent {
    /// The watcher categories an occurrence of this event wakes. Coarser
    /// categories always re-fire; finer ones fire only on exact match.
    pub fn wakes(self) -> EnumSet<IntEvent> {
        match self {
            IntEvent::Ground => IntEvent::Ground | IntEvent::Bound | IntEvent::Any,
            IntEvent::Bound => IntEvent::Bound | IntEvent::Any,
            IntEvent::Any => EnumSet::only(IntEvent::Any),
        }
    }
}

impl std::fmt::Display for IntEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntEvent::Ground => write!(f, "[Event:Ground]"),
            IntEvent::Bound => write!(f, "[Event:Bound]"),
            IntEvent::Any => write!(f, "[Event:Any]"),
        }
    }
}

/// The category of a pruning event on a set variable.
#[derive(EnumSetType, Enum, Debug, Hash)]
pub enum SetEvent {
    /// The guaranteed-included subset grew.
    Glb,
    /// The maximal-possible superset shrank.
    Lub,
    /// The cardinality interval was tightened.
    Card,
    /// Any change.
    Any,
}

impl SetEvent {
    /// The watcher categories an occurrence of this event wakes.
    pub fn wakes(self) -> EnumSet<SetEvent> {
        match self {
            SetEvent::Any => EnumSet::only(SetEvent::Any),
            other => other | SetEvent::Any,
        }
    }
}

/// A pruning event on either kind of variable, as delivered to
/// [`crate::propagation::Propagator::notify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruningEvent {
    Int(IntEvent),
    Set(SetEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_wakes_every_coarser_category() {
        assert_eq!(
            IntEvent::Ground | IntEvent::Bound | IntEvent::Any,
            IntEvent::Ground.wakes()
        );
        assert_eq!(IntEvent::Bound | IntEvent::Any, IntEvent::Bound.wakes());
        assert_eq!(EnumSet::only(IntEvent::Any), IntEvent::Any.wakes());
    }

    #[test]
    fn fine_set_events_wake_the_any_category() {
        assert!(SetEvent::Glb.wakes().contains(SetEvent::Any));
        assert!(!SetEvent::Glb.wakes().contains(SetEvent::Lub));
        assert_eq!(EnumSet::only(SetEvent::Any), SetEvent::Any.wakes());
    }
}
