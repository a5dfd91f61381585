//! Progress persistence and the unlock gate.
//!
//! - [`ProgressStore`] - flat key/value capability ([`MemoryStore`], [`FileStore`])
//! - [`ProgressGate`] - validates card codes, records completions, persists the document

mod error;
mod file_store;
mod gate;
mod store;

pub use error::*;
pub use file_store::FileStore;
pub use gate::{format_play_time, ProgressGate, RestoreOutcome};
pub use store::{MemoryStore, ProgressStore};
