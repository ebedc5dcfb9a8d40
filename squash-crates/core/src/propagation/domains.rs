use std::fmt::Debug;

use crate::engine::DomainStore;
use crate::engine::MutableStore;
use crate::engine::StateHandle;
use crate::variables::IntVarId;
use crate::variables::IntervalSet;
use crate::variables::SetVarId;

/// A read-only view of the store passed to propagators outside of
/// propagation itself: in [`crate::propagation::Propagator::notify`],
/// [`crate::propagation::Propagator::satisfied`], and
/// [`crate::propagation::Propagator::synchronise`].
#[derive(Clone, Copy, Debug)]
pub struct Domains<'a> {
    pub(crate) domains: &'a DomainStore,
    pub(crate) state: &'a MutableStore,
}

impl<'a> Domains<'a> {
    pub(crate) fn new(domains: &'a DomainStore, state: &'a MutableStore) -> Self {
        Domains { domains, state }
    }
}

mod private {
    use super::*;

    pub trait HasStores {
        fn domain_store(&self) -> &DomainStore;
        fn mutable_store(&self) -> &MutableStore;
    }

    impl HasStores for Domains<'_> {
        fn domain_store(&self) -> &DomainStore {
            self.domains
        }

        fn mutable_store(&self) -> &MutableStore {
            self.state
        }
    }

    impl HasStores for super::super::PropagationContext<'_> {
        fn domain_store(&self) -> &DomainStore {
            self.domains
        }

        fn mutable_store(&self) -> &MutableStore {
            self.state
        }
    }

    impl HasStores for super::super::PropagatorConstructorContext<'_> {
        fn domain_store(&self) -> &DomainStore {
            self.domains
        }

        fn mutable_store(&self) -> &MutableStore {
            self.state
        }
    }
}

/// Read access to variable domains and registry state, shared by every
/// context handed to propagators.
pub trait ReadDomains: private::HasStores {
    /// The store level the context operates at.
    fn level(&self) -> u32 {
        self.domain_store().level()
    }

    fn int_min(&self, var: IntVarId) -> i32 {
        self.domain_store().int_domain(var).min()
    }

    fn int_max(&self, var: IntVarId) -> i32 {
        self.domain_store().int_domain(var).max()
    }

    fn int_size(&self, var: IntVarId) -> u64 {
        self.domain_store().int_domain(var).size()
    }

    fn int_contains(&self, var: IntVarId, value: i32) -> bool {
        self.domain_store().int_domain(var).contains(value)
    }

    fn int_is_singleton(&self, var: IntVarId) -> bool {
        self.domain_store().int_domain(var).is_singleton()
    }

    /// The level at which the variable's domain was last narrowed.
    fn int_stamp(&self, var: IntVarId) -> u32 {
        self.domain_store().int_domain(var).stamp()
    }

    fn set_glb(&self, var: SetVarId) -> &IntervalSet {
        self.domain_store().set_domain(var).glb()
    }

    fn set_lub(&self, var: SetVarId) -> &IntervalSet {
        self.domain_store().set_domain(var).lub()
    }

    fn set_card_min(&self, var: SetVarId) -> i32 {
        self.domain_store().set_domain(var).card_min()
    }

    fn set_card_max(&self, var: SetVarId) -> i32 {
        self.domain_store().set_domain(var).card_max()
    }

    fn set_is_singleton(&self, var: SetVarId) -> bool {
        self.domain_store().set_domain(var).is_singleton()
    }

    fn set_stamp(&self, var: SetVarId) -> u32 {
        self.domain_store().set_domain(var).stamp()
    }

    /// The current value of a registry slot.
    fn state<T: Clone + Debug + 'static>(&self, handle: StateHandle<T>) -> &T {
        self.mutable_store().value(handle)
    }

    /// The level at which a registry slot was last written.
    fn state_stamp<T: Clone + Debug + 'static>(&self, handle: StateHandle<T>) -> u32 {
        self.mutable_store().stamp(handle)
    }
}

impl<Context: private::HasStores> ReadDomains for Context {}
