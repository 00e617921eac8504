//! Scene lifecycle across a replica set.

pub mod fingerprint;
pub mod orchestrator;
