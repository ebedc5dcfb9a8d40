//! The store and its supporting machinery: domain ownership and trailing,
//! the backtrackable-state registry, watcher lists, and the propagation
//! queues.

mod domain_store;
mod propagator_queue;
mod store;
pub(crate) mod test_solver;
mod trailed;
mod watch_list;

pub(crate) use domain_store::DomainStore;
pub(crate) use domain_store::PendingChange;
pub(crate) use propagator_queue::PropagatorQueue;
pub use store::Store;
pub use store::StoreConfig;
pub use trailed::MutableStore;
pub use trailed::StateHandle;
pub use trailed::StateId;
pub use trailed::TimeStamp;
pub(crate) use watch_list::WatchList;
