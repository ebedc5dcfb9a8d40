//! Backtrackable auxiliary state for propagators: versioned slots owned by
//! the store and restored during [`crate::Store::remove_level`], before the
//! variable trail is replayed.

mod mutable_store;
mod time_stamp;

pub use mutable_store::MutableStore;
pub use mutable_store::StateHandle;
pub use mutable_store::StateId;
pub use time_stamp::TimeStamp;
