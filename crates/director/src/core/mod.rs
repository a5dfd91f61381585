//! Phase runtime: the script contract, the context scripts run against and
//! the live instance the director owns.

mod context;
mod events;
mod instance;
mod phase;

pub use context::{PhaseContext, PhaseServices};
pub use events::OrderedEventEmitter;
pub use instance::PhaseInstance;
pub use phase::{PhaseFactory, PhaseRegistry, PhaseScript};
