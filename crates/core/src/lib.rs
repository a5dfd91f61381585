//! Domain types shared by every Aurora crate.
//!
//! - [`PhaseId`] and the static phase catalog
//! - [`ProgressState`] and its persisted JSON document form
//! - [`UnlockCodeTable`] and [`CodeValidation`]
//! - [`content`] tables with the narration and puzzle data of every phase

pub mod content;
pub mod domain;
pub mod error;

pub use domain::*;
pub use error::{CoreError, Result};
