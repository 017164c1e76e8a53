//! Notification events for the partner agent.
//!
//! This crate provides the lifecycle event types consumed by the
//! orchestrator, the envelope pushed to subscribers, and the broadcast bus
//! that delivers it.

mod bus;
mod message;
mod types;

pub use bus::{EventBus, NOTIFICATION_BUFFER};
pub use message::*;
pub use types::*;
