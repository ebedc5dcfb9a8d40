use super::DomainStore;
use super::MutableStore;
use super::PendingChange;
use super::PropagatorQueue;
use super::WatchList;
use crate::basic_types::DomainWipeout;
use crate::basic_types::ProtocolViolation;
use crate::containers::KeyedVec;
use crate::propagation::store::PropagatorStore;
use crate::propagation::Domains;
use crate::propagation::EnqueueDecision;
use crate::propagation::PropagationContext;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;
use crate::propagation::PropagatorId;
use crate::squash_assert_eq_simple;
use crate::squash_assert_simple;
use crate::variables::IntEvent;
use crate::variables::IntervalSet;
use crate::variables::IntVarId;
use crate::variables::PruningEvent;
use crate::variables::SetVarId;
use crate::variables::VarRef;

/// Configuration of a [`Store`], passed at construction. This replaces any
/// process-wide flags: two stores in one process can be configured
/// independently.
#[derive(Clone, Copy, Debug)]
pub struct StoreConfig {
    /// When `true`, a [`Store::consistency`] call that follows a failed call
    /// with no intervening [`Store::remove_level`] fails immediately instead
    /// of propagating over an inconsistent store.
    pub strict: bool,
    /// The number of propagation queues. No propagator may declare a queue
    /// index at or above this count.
    pub queue_count: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            strict: true,
            queue_count: 5,
        }
    }
}

/// The constraint store: the single owner of all variables, their trail, the
/// backtrackable-state registry, and the imposed propagators.
///
/// The store is driven from the outside in two phases. A model builder
/// creates variables and imposes constraints at the root level. A search
/// procedure then interleaves [`Store::set_level`] (open a backtracking
/// layer), decisions posted through the narrowing methods,
/// [`Store::consistency`] (propagate to a fixpoint), and
/// [`Store::remove_level`] (undo layers after a failed branch). All mutations
/// between two `set_level` calls are undone atomically by one `remove_level`
/// call.
#[derive(Debug)]
pub struct Store {
    config: StoreConfig,
    domains: DomainStore,
    state: MutableStore,
    watch_list: WatchList,
    queue: PropagatorQueue,
    propagators: PropagatorStore,
    queue_indices: KeyedVec<PropagatorId, u32>,
    remove_level_listeners: Vec<PropagatorId>,
    recently_failed: Option<PropagatorId>,
    failed: bool,
    num_consistency_calls: u64,
}

impl Default for Store {
    fn default() -> Self {
        Store::with_config(StoreConfig::default())
    }
}

impl Store {
    pub fn with_config(config: StoreConfig) -> Self {
        squash_assert_simple!(config.queue_count >= 1, "a store needs at least one queue");

        Store {
            config,
            domains: DomainStore::default(),
            state: MutableStore::default(),
            watch_list: WatchList::default(),
            queue: PropagatorQueue::new(config.queue_count),
            propagators: PropagatorStore::default(),
            queue_indices: KeyedVec::default(),
            remove_level_listeners: Vec::new(),
            recently_failed: None,
            failed: false,
            num_consistency_calls: 0,
        }
    }

    /// The current store level. Level 0 is the root; it is never removed.
    pub fn level(&self) -> u32 {
        self.domains.level()
    }

    /// A read-only view of the current domains and registry state.
    pub fn domains(&self) -> Domains<'_> {
        Domains::new(&self.domains, &self.state)
    }

    /// `true` when every variable is singleton-valued.
    pub fn is_ground(&self) -> bool {
        self.domains.is_ground()
    }

    /// The propagator that raised the wipeout in the most recent failed
    /// [`Store::consistency`] call, for diagnostics.
    pub fn recently_failed(&self) -> Option<PropagatorId> {
        self.recently_failed
    }

    /// The number of propagator invocations performed so far.
    pub fn num_consistency_calls(&self) -> u64 {
        self.num_consistency_calls
    }

    /// Asks the propagator whether it is entailed by the current domains.
    pub fn satisfied(&self, propagator: PropagatorId) -> bool {
        self.propagators[propagator].satisfied(Domains::new(&self.domains, &self.state))
    }
}

// Model building.
impl Store {
    /// Creates an integer variable with domain `{min, ..., max}`. Variables
    /// can only be created at the root level.
    pub fn new_int_var(
        &mut self,
        name: impl Into<String>,
        min: i32,
        max: i32,
    ) -> Result<IntVarId, ProtocolViolation> {
        let id = self.domains.new_int_var(name.into(), min, max)?;
        self.watch_list.grow_int();
        Ok(id)
    }

    /// Creates an integer variable whose domain holds exactly `values`.
    pub fn new_int_var_sparse(
        &mut self,
        name: impl Into<String>,
        values: &[i32],
    ) -> Result<IntVarId, ProtocolViolation> {
        let id = self.domains.new_int_var_sparse(name.into(), values)?;
        self.watch_list.grow_int();
        Ok(id)
    }

    /// Creates a set variable ranging from the empty set to `universe`.
    pub fn new_set_var(
        &mut self,
        name: impl Into<String>,
        universe: &[i32],
    ) -> Result<SetVarId, ProtocolViolation> {
        let id = self.domains.new_set_var(name.into(), universe)?;
        self.watch_list.grow_set();
        Ok(id)
    }

    pub fn var_by_name(&self, name: &str) -> Option<VarRef> {
        self.domains.var_by_name(name)
    }

    /// Imposes a constraint: runs its constructor (which registers the
    /// events it watches and seeds its backtrackable state) and schedules the
    /// propagator for the next [`Store::consistency`] call.
    pub fn impose<Constructor>(
        &mut self,
        constructor: Constructor,
    ) -> Result<PropagatorId, ProtocolViolation>
    where
        Constructor: PropagatorConstructor,
        Constructor::PropagatorImpl: 'static,
    {
        self.impose_internal(constructor, None)
    }

    /// Imposes a constraint on an explicit queue, overriding the queue index
    /// the propagator declares.
    pub fn impose_with_queue<Constructor>(
        &mut self,
        constructor: Constructor,
        queue_index: u32,
    ) -> Result<PropagatorId, ProtocolViolation>
    where
        Constructor: PropagatorConstructor,
        Constructor::PropagatorImpl: 'static,
    {
        if queue_index >= self.config.queue_count {
            return Err(ProtocolViolation::QueueIndexOutOfRange {
                index: queue_index,
                count: self.config.queue_count,
            });
        }
        self.impose_internal(constructor, Some(queue_index))
    }

    fn impose_internal<Constructor>(
        &mut self,
        constructor: Constructor,
        queue_override: Option<u32>,
    ) -> Result<PropagatorId, ProtocolViolation>
    where
        Constructor: PropagatorConstructor,
        Constructor::PropagatorImpl: 'static,
    {
        if self.domains.level() != 0 {
            return Err(ProtocolViolation::NotAtRootLevel(self.domains.level()));
        }

        let id = self.propagators.next_id();
        let context = PropagatorConstructorContext {
            watch_list: &mut self.watch_list,
            domains: &self.domains,
            state: &mut self.state,
            remove_level_listeners: &mut self.remove_level_listeners,
            propagator_id: id,
        };
        let propagator = constructor.create(context);

        let queue_index = queue_override.unwrap_or_else(|| propagator.queue_index());
        if queue_index >= self.config.queue_count {
            // The constructor already registered interest; strip it so the
            // rejected id can never be woken.
            self.watch_list.remove_propagator(id);
            self.remove_level_listeners.retain(|&listener| listener != id);
            return Err(ProtocolViolation::QueueIndexOutOfRange {
                index: queue_index,
                count: self.config.queue_count,
            });
        }

        let pushed = self.propagators.push(Box::new(propagator));
        squash_assert_eq_simple!(id, pushed);
        let _ = self.queue_indices.push(queue_index);
        self.queue.enqueue(id, queue_index);

        log::debug!(
            "imposed {} as {id} on queue {queue_index}",
            self.propagators[id].name()
        );
        Ok(id)
    }

    /// Schedules a propagator for re-evaluation by hand. Rarely needed;
    /// propagators are normally scheduled by the events of their variables.
    pub fn schedule(&mut self, propagator: PropagatorId) {
        self.queue.enqueue(propagator, self.queue_indices[propagator]);
    }

    /// Places `propagator` on the watched side channel of `var`: it is
    /// enqueued whenever `var` becomes singleton, independent of its queue
    /// registrations. Watched propagators are active all the time; use this
    /// with care.
    pub fn register_watched(&mut self, var: IntVarId, propagator: PropagatorId) {
        self.watch_list.register_watched(var, propagator);
    }

    pub fn deregister_watched(&mut self, var: IntVarId, propagator: PropagatorId) {
        self.watch_list.deregister_watched(var, propagator);
    }
}

// The level protocol.
impl Store {
    /// Opens backtracking layers up to `level`. A call with the current
    /// level is a no-op; a call with a lower level is a protocol violation
    /// (backtracking goes through [`Store::remove_level`]).
    pub fn set_level(&mut self, level: u32) {
        if level == self.domains.level() {
            return;
        }
        squash_assert_simple!(
            level > self.domains.level(),
            "set_level only opens new layers, use remove_level to backtrack"
        );

        while self.domains.level() < level {
            self.domains.open_level();
        }
        log::trace!("store level raised to {level}");
    }

    /// Undoes every mutation recorded at the levels at or above `level`:
    /// variable domains, registry slots, and the pending queues. The store
    /// drops to `level - 1`. Listener hooks run before the removal (old
    /// incremental state is still readable) and every propagator is
    /// resynchronised afterwards.
    pub fn remove_level(&mut self, level: u32) {
        squash_assert_simple!(
            level >= 1 && level <= self.domains.level(),
            "remove_level targets a level that was opened"
        );

        self.failed = false;
        self.queue.clear();
        self.domains.clear_pending();

        for &listener in &self.remove_level_listeners {
            self.propagators[listener].on_remove_level(level);
        }

        // The registry is restored before the variable trail: a propagator
        // must never observe restored domains next to stale private state.
        self.state.remove_level(level);
        self.domains.remove_level(level);

        for propagator in self.propagators.iter_mut() {
            propagator.synchronise(Domains::new(&self.domains, &self.state));
        }

        log::trace!("store level dropped to {}", self.domains.level());
    }

    /// Propagates to a fixpoint. Returns `true` when every queue emptied
    /// without a wipeout; `false` as soon as any propagator fails, leaving
    /// all domains exactly as the failing propagator observed them. The
    /// failure is recovered only by [`Store::remove_level`].
    pub fn consistency(&mut self) -> bool {
        if self.config.strict && self.failed {
            return false;
        }

        self.drain_pending(None);

        while let Some(propagator_id) = self.queue.pop() {
            self.num_consistency_calls += 1;

            let status = {
                let context = PropagationContext::new(&mut self.domains, &mut self.state);
                self.propagators[propagator_id].propagate(context)
            };

            match status {
                Ok(()) => self.drain_pending(Some(propagator_id)),
                Err(DomainWipeout) => {
                    self.propagators[propagator_id].clean_after_failure();
                    self.recently_failed = Some(propagator_id);
                    self.queue.clear();
                    self.domains.clear_pending();
                    self.failed = true;

                    log::debug!(
                        "{} failed at level {}",
                        self.propagators[propagator_id].name(),
                        self.domains.level()
                    );
                    return false;
                }
            }
        }

        true
    }

    /// Translates buffered domain changes into notifications: every watcher
    /// whose category is woken by the event is notified and, unless it is
    /// the propagator that just ran or it answers
    /// [`EnqueueDecision::Skip`], enqueued. The running propagator is still
    /// *notified* of its own pruning so its incremental state stays in step;
    /// it is only exempt from re-queueing itself.
    fn drain_pending(&mut self, running: Option<PropagatorId>) {
        while let Some(change) = self.domains.pop_pending() {
            match change {
                PendingChange::Int(var, event) => {
                    for category in event.wakes() {
                        for watcher_index in 0..self.watch_list.int_watchers(var, category).len() {
                            let watcher = self.watch_list.int_watchers(var, category)[watcher_index];
                            let decision = self.propagators[watcher.propagator].notify(
                                Domains::new(&self.domains, &self.state),
                                watcher.variable,
                                PruningEvent::Int(event),
                            );
                            if decision == EnqueueDecision::Enqueue
                                && running != Some(watcher.propagator)
                            {
                                self.queue
                                    .enqueue(watcher.propagator, self.queue_indices[watcher.propagator]);
                            }
                        }
                    }

                    // The watched side channel bypasses the category lists:
                    // consulted on singleton events only, no notify call.
                    if event == IntEvent::Ground {
                        for watcher_index in 0..self.watch_list.watched(var).len() {
                            let propagator = self.watch_list.watched(var)[watcher_index];
                            if running != Some(propagator) {
                                self.queue.enqueue(propagator, self.queue_indices[propagator]);
                            }
                        }
                    }
                }
                PendingChange::Set(var, event) => {
                    for category in event.wakes() {
                        for watcher_index in 0..self.watch_list.set_watchers(var, category).len() {
                            let watcher = self.watch_list.set_watchers(var, category)[watcher_index];
                            let decision = self.propagators[watcher.propagator].notify(
                                Domains::new(&self.domains, &self.state),
                                watcher.variable,
                                PruningEvent::Set(event),
                            );
                            if decision == EnqueueDecision::Enqueue
                                && running != Some(watcher.propagator)
                            {
                                self.queue
                                    .enqueue(watcher.propagator, self.queue_indices[watcher.propagator]);
                            }
                        }
                    }
                }
            }
        }
    }
}

// Narrowing, for search decisions and root-level strengthening. These are
// the same trailed operations propagators use; changes made here are picked
// up by the next `consistency` call.
impl Store {
    pub fn in_min(&mut self, var: IntVarId, bound: i32) -> Result<bool, DomainWipeout> {
        self.domains.in_min(var, bound)
    }

    pub fn in_max(&mut self, var: IntVarId, bound: i32) -> Result<bool, DomainWipeout> {
        self.domains.in_max(var, bound)
    }

    pub fn in_value(&mut self, var: IntVarId, value: i32) -> Result<bool, DomainWipeout> {
        self.domains.in_value(var, value)
    }

    pub fn remove_value(&mut self, var: IntVarId, value: i32) -> Result<bool, DomainWipeout> {
        self.domains.remove_value(var, value)
    }

    pub fn in_glb(
        &mut self,
        var: SetVarId,
        set: &IntervalSet,
    ) -> Result<bool, DomainWipeout> {
        self.domains.in_glb(var, set)
    }

    pub fn in_lub(
        &mut self,
        var: SetVarId,
        set: &IntervalSet,
    ) -> Result<bool, DomainWipeout> {
        self.domains.in_lub(var, set)
    }

    pub fn in_lub_complement(&mut self, var: SetVarId, value: i32) -> Result<bool, DomainWipeout> {
        self.domains.in_lub_complement(var, value)
    }

    pub fn in_cardinality(
        &mut self,
        var: SetVarId,
        min: i32,
        max: i32,
    ) -> Result<bool, DomainWipeout> {
        self.domains.in_cardinality(var, min, max)
    }

    pub fn fix_set(
        &mut self,
        var: SetVarId,
        set: &IntervalSet,
    ) -> Result<bool, DomainWipeout> {
        self.domains.fix_set(var, set)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::basic_types::PropagationStatus;
    use crate::propagation::Propagator;
    use crate::propagation::ReadDomains;

    /// Test propagator for `x < y`, propagating bounds in both directions.
    struct LessThanArgs {
        x: IntVarId,
        y: IntVarId,
    }

    impl PropagatorConstructor for LessThanArgs {
        type PropagatorImpl = LessThan;

        fn create(self, mut context: PropagatorConstructorContext<'_>) -> LessThan {
            let LessThanArgs { x, y } = self;
            context.register_int(x, IntEvent::Bound, crate::propagation::LocalId::from(0));
            context.register_int(y, IntEvent::Bound, crate::propagation::LocalId::from(1));
            LessThan { x, y }
        }
    }

    struct LessThan {
        x: IntVarId,
        y: IntVarId,
    }

    impl Propagator for LessThan {
        fn name(&self) -> &str {
            "LessThan"
        }

        fn queue_index(&self) -> u32 {
            0
        }

        fn propagate(&mut self, mut context: PropagationContext<'_>) -> PropagationStatus {
            let _ = context.in_max(self.x, context.int_max(self.y) - 1)?;
            let _ = context.in_min(self.y, context.int_min(self.x) + 1)?;
            Ok(())
        }

        fn satisfied(&self, context: Domains<'_>) -> bool {
            context.int_max(self.x) < context.int_min(self.y)
        }
    }

    /// Test propagator that records its life-cycle events.
    struct RecorderArgs {
        label: &'static str,
        queue_index: u32,
        log: Rc<RefCell<Vec<String>>>,
        watched_only: Option<IntVarId>,
    }

    impl PropagatorConstructor for RecorderArgs {
        type PropagatorImpl = Recorder;

        fn create(self, mut context: PropagatorConstructorContext<'_>) -> Recorder {
            let RecorderArgs {
                label,
                queue_index,
                log,
                watched_only,
            } = self;
            if let Some(var) = watched_only {
                context.register_watched(var);
                context.register_remove_level_listener();
            }
            Recorder {
                label,
                queue_index,
                log,
            }
        }
    }

    struct Recorder {
        label: &'static str,
        queue_index: u32,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Propagator for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn queue_index(&self) -> u32 {
            self.queue_index
        }

        fn propagate(&mut self, _context: PropagationContext<'_>) -> PropagationStatus {
            self.log.borrow_mut().push(format!("run {}", self.label));
            Ok(())
        }

        fn on_remove_level(&mut self, level: u32) {
            self.log
                .borrow_mut()
                .push(format!("before-remove {level} {}", self.label));
        }

        fn synchronise(&mut self, _context: Domains<'_>) {
            self.log
                .borrow_mut()
                .push(format!("synchronise {}", self.label));
        }
    }

    fn chain_model() -> (Store, IntVarId, IntVarId, IntVarId) {
        let mut store = Store::default();
        let x = store.new_int_var("x", 0, 4).expect("fresh");
        let y = store.new_int_var("y", 0, 4).expect("fresh");
        let z = store.new_int_var("z", 0, 4).expect("fresh");
        let _ = store.impose(LessThanArgs { x, y }).expect("valid");
        let _ = store.impose(LessThanArgs { x: y, y: z }).expect("valid");
        (store, x, y, z)
    }

    #[test]
    fn propagation_reaches_a_fixpoint_and_is_idempotent() {
        let (mut store, x, y, z) = chain_model();

        assert!(store.consistency());
        let domains = store.domains();
        assert_eq!((0, 2), (domains.int_min(x), domains.int_max(x)));
        assert_eq!((1, 3), (domains.int_min(y), domains.int_max(y)));
        assert_eq!((2, 4), (domains.int_min(z), domains.int_max(z)));

        // At the fixpoint a second call schedules nothing and changes nothing.
        let invocations = store.num_consistency_calls();
        assert!(store.consistency());
        assert_eq!(invocations, store.num_consistency_calls());
        let domains = store.domains();
        assert_eq!((0, 2), (domains.int_min(x), domains.int_max(x)));
        assert_eq!((2, 4), (domains.int_min(z), domains.int_max(z)));
    }

    #[test]
    fn removing_a_level_restores_domains_bit_for_bit() {
        let mut store = Store::default();
        let x = store
            .new_int_var_sparse("x", &[0, 2, 4, 7])
            .expect("fresh");

        store.set_level(1);
        let _ = store.in_min(x, 3).expect("non-empty");
        let _ = store.remove_value(x, 4).expect("non-empty");
        assert_eq!((7, 7), (store.domains().int_min(x), store.domains().int_max(x)));

        store.remove_level(1);
        assert_eq!(0, store.level());
        let domains = store.domains();
        assert_eq!((0, 7), (domains.int_min(x), domains.int_max(x)));
        assert_eq!(4, domains.int_size(x));
        for value in [0, 2, 4, 7] {
            assert!(domains.int_contains(x, value));
        }
        assert!(!domains.int_contains(x, 1));
    }

    #[test]
    fn a_wipeout_fails_consistency_and_latches_until_remove_level() {
        let (mut store, x, _, z) = chain_model();

        store.set_level(1);
        let _ = store.in_min(x, 3).expect("non-empty");
        // x >= 3 forces y >= 4 and z >= 5, which is out of range.
        assert!(!store.consistency());
        assert!(store.recently_failed().is_some());

        // Strict mode: no propagation happens over the failed store.
        let invocations = store.num_consistency_calls();
        assert!(!store.consistency());
        assert_eq!(invocations, store.num_consistency_calls());

        // Backtracking restores the pre-decision domains and clears the
        // latch; nothing is scheduled, so consistency succeeds untouched.
        store.remove_level(1);
        let domains = store.domains();
        assert_eq!((0, 4), (domains.int_min(x), domains.int_max(x)));
        assert_eq!((0, 4), (domains.int_min(z), domains.int_max(z)));
        assert!(store.consistency());
    }

    #[test]
    fn failing_narrowing_leaves_domains_as_observed() {
        let mut store = Store::default();
        let x = store.new_int_var("x", 5, 5).expect("fresh");
        let y = store.new_int_var("y", 0, 5).expect("fresh");
        let _ = store.impose(LessThanArgs { x, y }).expect("valid");

        assert!(!store.consistency());
        let domains = store.domains();
        assert_eq!((5, 5), (domains.int_min(x), domains.int_max(x)));
        assert_eq!((0, 5), (domains.int_min(y), domains.int_max(y)));
    }

    #[test]
    fn lower_queue_indices_run_first() {
        let mut store = Store::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        let _ = store
            .impose(RecorderArgs {
                label: "slow",
                queue_index: 4,
                log: Rc::clone(&log),
                watched_only: None,
            })
            .expect("valid");
        let _ = store
            .impose(RecorderArgs {
                label: "fast",
                queue_index: 0,
                log: Rc::clone(&log),
                watched_only: None,
            })
            .expect("valid");

        assert!(store.consistency());
        assert_eq!(vec!["run fast", "run slow"], *log.borrow());
    }

    #[test]
    fn the_watched_side_channel_fires_on_ground_only() {
        let mut store = Store::default();
        let x = store.new_int_var("x", 0, 5).expect("fresh");
        let log = Rc::new(RefCell::new(Vec::new()));

        let _ = store
            .impose(RecorderArgs {
                label: "watcher",
                queue_index: 0,
                log: Rc::clone(&log),
                watched_only: Some(x),
            })
            .expect("valid");

        // Drain the imposition-time scheduling.
        assert!(store.consistency());
        log.borrow_mut().clear();

        store.set_level(1);
        let _ = store.in_min(x, 2).expect("non-empty");
        assert!(store.consistency());
        assert!(log.borrow().is_empty());

        let _ = store.in_value(x, 3).expect("non-empty");
        assert!(store.consistency());
        assert_eq!(vec!["run watcher"], *log.borrow());
    }

    #[test]
    fn remove_level_runs_listeners_before_and_synchronise_after() {
        let mut store = Store::default();
        let x = store.new_int_var("x", 0, 5).expect("fresh");
        let log = Rc::new(RefCell::new(Vec::new()));

        let _ = store
            .impose(RecorderArgs {
                label: "listener",
                queue_index: 0,
                log: Rc::clone(&log),
                watched_only: Some(x),
            })
            .expect("valid");
        assert!(store.consistency());
        log.borrow_mut().clear();

        store.set_level(2);
        let _ = store.in_min(x, 1).expect("non-empty");
        store.remove_level(1);

        assert_eq!(
            vec!["before-remove 1 listener", "synchronise listener"],
            *log.borrow()
        );
        assert_eq!(0, store.level());
    }

    #[test]
    fn queue_index_out_of_range_is_a_protocol_violation() {
        let mut store = Store::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        let result = store.impose(RecorderArgs {
            label: "overflow",
            queue_index: 9,
            log,
            watched_only: None,
        });
        assert_eq!(
            Err(ProtocolViolation::QueueIndexOutOfRange { index: 9, count: 5 }),
            result.map(|_| ())
        );
    }

    #[test]
    fn variables_cannot_be_created_mid_search() {
        let mut store = Store::default();
        store.set_level(1);
        assert_eq!(
            Err(ProtocolViolation::NotAtRootLevel(1)),
            store.new_int_var("late", 0, 1).map(|_| ())
        );
    }
}
