use std::collections::VecDeque;

use fnv::FnvHashMap;

use crate::basic_types::DomainWipeout;
use crate::basic_types::ProtocolViolation;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::squash_assert_moderate;
use crate::squash_assert_simple;
use crate::variables::IntDomain;
use crate::variables::IntEvent;
use crate::variables::IntVarId;
use crate::variables::IntervalSet;
use crate::variables::SetDomain;
use crate::variables::SetEvent;
use crate::variables::SetValue;
use crate::variables::SetVarId;
use crate::variables::VarRef;

/// A domain change waiting to be translated into propagator notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PendingChange {
    Int(IntVarId, IntEvent),
    Set(SetVarId, SetEvent),
}

/// The owner of every variable domain, the trail that makes them restorable,
/// and the buffer of pruning events produced since the engine last looked.
///
/// All narrowing routes through here: a mutation is validated first (a
/// failing operation leaves the domain untouched), then the pre-mutation
/// state is saved and the variable trailed if this is the first change at the
/// current level, and finally the pruning event is buffered.
#[derive(Debug, Default)]
pub(crate) struct DomainStore {
    level: u32,
    int_domains: KeyedVec<IntVarId, IntDomain>,
    set_domains: KeyedVec<SetVarId, SetDomain>,
    int_names: KeyedVec<IntVarId, String>,
    set_names: KeyedVec<SetVarId, String>,
    names: FnvHashMap<String, VarRef>,
    trail: Trail<VarRef>,
    pending: VecDeque<PendingChange>,
}

impl DomainStore {
    pub(crate) fn level(&self) -> u32 {
        self.level
    }

    pub(crate) fn open_level(&mut self) {
        self.level += 1;
        self.trail.new_level();
        squash_assert_moderate!(self.trail.level() == self.level);
    }

    /// Undoes every change recorded at a level at or above `level`, replaying
    /// the trail in reverse creation order. The store drops to `level - 1`.
    pub(crate) fn remove_level(&mut self, level: u32) {
        squash_assert_simple!(
            level >= 1 && level <= self.level,
            "remove_level targets a level that was opened"
        );

        let int_domains = &mut self.int_domains;
        let set_domains = &mut self.set_domains;
        self.trail.rewind_to(level - 1).for_each(|var| match var {
            VarRef::Int(id) => int_domains[id].restore_saved(),
            VarRef::Set(id) => set_domains[id].restore_saved(),
        });
        self.level = level - 1;
    }

    pub(crate) fn pop_pending(&mut self) -> Option<PendingChange> {
        self.pending.pop_front()
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn is_ground(&self) -> bool {
        self.int_domains.iter().all(IntDomain::is_singleton)
            && self.set_domains.iter().all(SetDomain::is_singleton)
    }
}

// Variable creation. Variables can only be created at the root level; the
// trail has no layer to attribute a mid-search creation to.
impl DomainStore {
    pub(crate) fn new_int_var(
        &mut self,
        name: String,
        min: i32,
        max: i32,
    ) -> Result<IntVarId, ProtocolViolation> {
        if min > max {
            return Err(ProtocolViolation::EmptyInitialDomain { name });
        }
        self.check_creation(&name)?;

        let id = self.int_domains.push(IntDomain::new(min, max));
        let _ = self.names.insert(name.clone(), VarRef::Int(id));
        let _ = self.int_names.push(name);
        Ok(id)
    }

    pub(crate) fn new_int_var_sparse(
        &mut self,
        name: String,
        values: &[i32],
    ) -> Result<IntVarId, ProtocolViolation> {
        if values.is_empty() {
            return Err(ProtocolViolation::EmptyInitialDomain { name });
        }
        self.check_creation(&name)?;

        let id = self.int_domains.push(IntDomain::from_values(values));
        let _ = self.names.insert(name.clone(), VarRef::Int(id));
        let _ = self.int_names.push(name);
        Ok(id)
    }

    pub(crate) fn new_set_var(
        &mut self,
        name: String,
        universe: &[i32],
    ) -> Result<SetVarId, ProtocolViolation> {
        self.check_creation(&name)?;

        let id = self
            .set_domains
            .push(SetDomain::new(IntervalSet::from_values(universe)));
        let _ = self.names.insert(name.clone(), VarRef::Set(id));
        let _ = self.set_names.push(name);
        Ok(id)
    }

    pub(crate) fn var_by_name(&self, name: &str) -> Option<VarRef> {
        self.names.get(name).copied()
    }

    fn check_creation(&self, name: &str) -> Result<(), ProtocolViolation> {
        if self.level != 0 {
            return Err(ProtocolViolation::NotAtRootLevel(self.level));
        }
        if self.names.contains_key(name) {
            return Err(ProtocolViolation::DuplicateVariable(name.to_owned()));
        }
        Ok(())
    }
}

// Read access.
impl DomainStore {
    pub(crate) fn int_domain(&self, var: IntVarId) -> &IntDomain {
        &self.int_domains[var]
    }

    pub(crate) fn set_domain(&self, var: SetVarId) -> &SetDomain {
        &self.set_domains[var]
    }
}

// Integer narrowing. Every operation returns whether a change occurred;
// narrowing to an already-satisfied bound is a no-op, not an error.
impl DomainStore {
    pub(crate) fn in_min(&mut self, var: IntVarId, bound: i32) -> Result<bool, DomainWipeout> {
        let domain = &self.int_domains[var];
        if bound <= domain.min() {
            return Ok(false);
        }
        if bound > domain.max() {
            return Err(DomainWipeout);
        }

        self.prepare_int(var);
        let _ = self.int_domains[var].values_mut().retain_from(bound);
        let event = bound_event(&self.int_domains[var]);
        self.push_int_event(var, event);
        Ok(true)
    }

    pub(crate) fn in_max(&mut self, var: IntVarId, bound: i32) -> Result<bool, DomainWipeout> {
        let domain = &self.int_domains[var];
        if bound >= domain.max() {
            return Ok(false);
        }
        if bound < domain.min() {
            return Err(DomainWipeout);
        }

        self.prepare_int(var);
        let _ = self.int_domains[var].values_mut().retain_until(bound);
        let event = bound_event(&self.int_domains[var]);
        self.push_int_event(var, event);
        Ok(true)
    }

    pub(crate) fn in_value(&mut self, var: IntVarId, value: i32) -> Result<bool, DomainWipeout> {
        let domain = &self.int_domains[var];
        if !domain.contains(value) {
            return Err(DomainWipeout);
        }
        if domain.is_singleton() {
            return Ok(false);
        }

        self.prepare_int(var);
        let domain = self.int_domains[var].values_mut();
        let _ = domain.retain_from(value);
        let _ = domain.retain_until(value);
        self.push_int_event(var, IntEvent::Ground);
        Ok(true)
    }

    pub(crate) fn remove_value(&mut self, var: IntVarId, value: i32) -> Result<bool, DomainWipeout> {
        let domain = &self.int_domains[var];
        if !domain.contains(value) {
            return Ok(false);
        }
        if domain.is_singleton() {
            return Err(DomainWipeout);
        }
        let was_bound = value == domain.min() || value == domain.max();

        self.prepare_int(var);
        let domain = &mut self.int_domains[var];
        let _ = domain.values_mut().remove(value);
        let event = if domain.is_singleton() {
            IntEvent::Ground
        } else if was_bound {
            IntEvent::Bound
        } else {
            IntEvent::Any
        };
        self.push_int_event(var, event);
        Ok(true)
    }

    fn prepare_int(&mut self, var: IntVarId) {
        let domain = &mut self.int_domains[var];
        if domain.stamp() < self.level {
            domain.save_at(self.level);
            self.trail.push(VarRef::Int(var));
        }
    }

    fn push_int_event(&mut self, var: IntVarId, event: IntEvent) {
        log::trace!("{} {} at level {}", self.int_names[var], event, self.level);
        self.pending.push_back(PendingChange::Int(var, event));
    }
}

// Set narrowing.
impl DomainStore {
    pub(crate) fn in_glb(
        &mut self,
        var: SetVarId,
        set: &IntervalSet,
    ) -> Result<bool, DomainWipeout> {
        let mut candidate = self.set_domains[var].value().clone();
        let _ = candidate.glb.union_with(set);
        self.commit_set(var, candidate)
    }

    pub(crate) fn in_lub(
        &mut self,
        var: SetVarId,
        set: &IntervalSet,
    ) -> Result<bool, DomainWipeout> {
        let mut candidate = self.set_domains[var].value().clone();
        let _ = candidate.lub.intersect_with(set);
        self.commit_set(var, candidate)
    }

    pub(crate) fn in_lub_complement(
        &mut self,
        var: SetVarId,
        value: i32,
    ) -> Result<bool, DomainWipeout> {
        let mut candidate = self.set_domains[var].value().clone();
        let _ = candidate.lub.remove(value);
        self.commit_set(var, candidate)
    }

    pub(crate) fn in_cardinality(
        &mut self,
        var: SetVarId,
        min: i32,
        max: i32,
    ) -> Result<bool, DomainWipeout> {
        let mut candidate = self.set_domains[var].value().clone();
        candidate.card_min = candidate.card_min.max(min);
        candidate.card_max = candidate.card_max.min(max);
        self.commit_set(var, candidate)
    }

    pub(crate) fn fix_set(
        &mut self,
        var: SetVarId,
        set: &IntervalSet,
    ) -> Result<bool, DomainWipeout> {
        let mut candidate = self.set_domains[var].value().clone();
        let _ = candidate.glb.union_with(set);
        let _ = candidate.lub.intersect_with(set);
        self.commit_set(var, candidate)
    }

    /// Refines a candidate value and installs it, emitting one event per
    /// component that actually changed. A candidate that refines to the
    /// current value is a no-op.
    fn commit_set(
        &mut self,
        var: SetVarId,
        candidate: SetValue,
    ) -> Result<bool, DomainWipeout> {
        let refined = candidate.refined()?;

        let (glb_changed, lub_changed, card_changed) = {
            let old = self.set_domains[var].value();
            (
                refined.glb != old.glb,
                refined.lub != old.lub,
                (refined.card_min, refined.card_max) != (old.card_min, old.card_max),
            )
        };
        if !(glb_changed || lub_changed || card_changed) {
            return Ok(false);
        }

        self.prepare_set(var);
        self.set_domains[var].commit(refined);

        if glb_changed {
            self.push_set_event(var, SetEvent::Glb);
        }
        if lub_changed {
            self.push_set_event(var, SetEvent::Lub);
        }
        if card_changed {
            self.push_set_event(var, SetEvent::Card);
        }
        Ok(true)
    }

    fn prepare_set(&mut self, var: SetVarId) {
        let domain = &mut self.set_domains[var];
        if domain.stamp() < self.level {
            domain.save_at(self.level);
            self.trail.push(VarRef::Set(var));
        }
    }

    fn push_set_event(&mut self, var: SetVarId, event: SetEvent) {
        log::trace!(
            "{} {event:?} at level {}",
            self.set_names[var],
            self.level
        );
        self.pending.push_back(PendingChange::Set(var, event));
    }
}

fn bound_event(domain: &IntDomain) -> IntEvent {
    if domain.is_singleton() {
        IntEvent::Ground
    } else {
        IntEvent::Bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_var(min: i32, max: i32) -> (DomainStore, IntVarId) {
        let mut store = DomainStore::default();
        let var = store.new_int_var("x".to_owned(), min, max).expect("fresh");
        (store, var)
    }

    #[test]
    fn narrowing_an_excluded_bound_is_a_no_op() {
        let (mut store, var) = store_with_var(0, 5);
        assert_eq!(Ok(true), store.in_min(var, 3));
        assert_eq!(Ok(false), store.in_min(var, 3));
        assert_eq!(Ok(false), store.in_min(var, 1));
    }

    #[test]
    fn wipeout_leaves_the_domain_untouched() {
        let (mut store, var) = store_with_var(0, 5);
        assert_eq!(Err(DomainWipeout), store.in_min(var, 6));
        assert_eq!(0, store.int_domain(var).min());
        assert_eq!(5, store.int_domain(var).max());
    }

    #[test]
    fn changes_at_a_level_are_undone_together() {
        let (mut store, var) = store_with_var(0, 9);

        store.open_level();
        let _ = store.in_min(var, 2).expect("non-empty");
        let _ = store.in_max(var, 7).expect("non-empty");
        let _ = store.remove_value(var, 5).expect("non-empty");

        store.open_level();
        let _ = store.in_value(var, 3).expect("non-empty");

        store.remove_level(1);
        assert_eq!(0, store.int_domain(var).min());
        assert_eq!(9, store.int_domain(var).max());
        assert!(store.int_domain(var).contains(5));
        assert_eq!(0, store.level());
    }

    #[test]
    fn domains_shrink_monotonically_within_a_level() {
        let (mut store, var) = store_with_var(0, 9);
        store.open_level();

        let _ = store.in_min(var, 2).expect("non-empty");
        assert_eq!(8, store.int_domain(var).size());
        let _ = store.remove_value(var, 5).expect("non-empty");
        assert_eq!(7, store.int_domain(var).size());
        let _ = store.in_max(var, 7).expect("non-empty");
        assert_eq!(5, store.int_domain(var).size());
        // A no-op narrowing does not change the size either way.
        let _ = store.in_min(var, 2).expect("non-empty");
        assert_eq!(5, store.int_domain(var).size());
    }

    #[test]
    fn root_level_changes_are_permanent() {
        let (mut store, var) = store_with_var(0, 9);
        let _ = store.in_min(var, 4).expect("non-empty");

        store.open_level();
        let _ = store.in_min(var, 6).expect("non-empty");
        store.remove_level(1);

        assert_eq!(4, store.int_domain(var).min());
    }

    #[test]
    fn grounding_emits_a_ground_event() {
        let (mut store, var) = store_with_var(0, 5);
        let _ = store.in_min(var, 5).expect("non-empty");
        assert_eq!(
            Some(PendingChange::Int(var, IntEvent::Ground)),
            store.pop_pending()
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut store = DomainStore::default();
        let _ = store.new_int_var("x".to_owned(), 0, 1).expect("fresh");
        assert_eq!(
            Err(ProtocolViolation::DuplicateVariable("x".to_owned())),
            store.new_set_var("x".to_owned(), &[1, 2])
        );
    }

    #[test]
    fn set_narrowing_collapses_via_cardinality() {
        let mut store = DomainStore::default();
        let var = store.new_set_var("s".to_owned(), &[1, 2, 3]).expect("fresh");

        let _ = store.in_cardinality(var, 3, 3).expect("feasible");
        assert!(store.set_domain(var).is_singleton());
        assert_eq!(3, store.set_domain(var).glb().size());
    }

    #[test]
    fn removing_a_guaranteed_element_from_the_lub_is_a_wipeout() {
        let mut store = DomainStore::default();
        let var = store.new_set_var("s".to_owned(), &[1, 2, 3]).expect("fresh");

        let _ = store
            .in_glb(var, &IntervalSet::from_values(&[2]))
            .expect("feasible");
        assert_eq!(Err(DomainWipeout), store.in_lub_complement(var, 2));
        assert!(store.set_domain(var).lub().contains(2));
    }
}
