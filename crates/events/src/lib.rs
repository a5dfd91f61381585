//! Event system for Aurora
//!
//! This crate provides the event bus and the lifecycle event types the
//! director publishes while phases are requested, run and torn down.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
