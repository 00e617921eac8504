//! Replica threads: one engine per thread, driven over channels.
//!
//! The host only ever sends commands and receives events; replicas never share mutable state.

mod messages;
mod set;
mod worker;

pub use messages::{ReplicaCommand, ReplicaEvent, ReplicaMessage};
pub use set::ReplicaSet;
