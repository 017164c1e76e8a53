//! Domain model for the partner agent notification core.
//!
//! Exchange snapshots and partners are owned by the protocol engine and the
//! partner directory; activities and tasks are owned by the activity store.

pub mod domain;

pub use domain::*;
