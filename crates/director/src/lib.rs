//! Phase lifecycle and sequencing for the Aurora journey.
//!
//! - [`PhaseDirector`] - owns the single live phase and serializes phase changes
//! - [`PhaseContext`] - what a running script sees: pacing, gates, scene, audio, text
//! - [`ResourceLedger`] - timers and animations that die with their phase
//! - [`Surfaces`] - the scene, audio and presentation capabilities the host supplies

pub mod animation;
pub mod core;
pub mod director;
pub mod error;
pub mod interaction;
pub mod phases;
pub mod recording;
pub mod resources;
pub mod state_machine;
pub mod surfaces;
pub mod transition;

pub use crate::core::{PhaseContext, PhaseInstance, PhaseRegistry, PhaseScript};
pub use director::{DirectorCommand, DirectorConfig, DirectorHandle, PhaseDirector};
pub use error::{DirectorError, PhaseError, PhaseResult, Result};
pub use interaction::{Direction, GateId, GateOutcome, GatePolicy, Interaction, PlayerInput};
pub use recording::{Recorder, SurfaceCall};
pub use resources::{EffectHandle, ResourceLedger};
pub use state_machine::LifecycleMachine;
pub use surfaces::{
    AudioHandle, AudioSurface, Background, BoardView, Color, Counter, LoadError, MusicOptions,
    ObjectHandle, Placement, PresentationSurface, SceneSurface, SfxOptions, Shape, Surfaces,
    ToastKind, VoiceOptions,
};
