//! Per-phase resource bookkeeping.
//!
//! [`ResourceLedger`] owns every timer and animation a phase schedules;
//! [`OwnedResources`] remembers the scene objects and widgets it created.
//! Both are released together when the phase is torn down.

mod ledger;
mod owned;

pub use ledger::{EffectHandle, LedgerReleased, ResourceLedger, DEFAULT_FRAME_INTERVAL};
pub use owned::OwnedResources;
