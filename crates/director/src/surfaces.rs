//! Capabilities a phase uses to touch the outside world.
//!
//! The scene, the audio mixer and the presentation layer are shared by every
//! phase and owned by the host. Phases only ever reach them through
//! [`Surfaces`], which the director injects into each phase context.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aurora_core::PhaseId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::{Property, TweenTarget};
use crate::interaction::{GateId, Interaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub u64);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(pub u64);

/// 0xRRGGBB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xffffff);
    pub const GOLD: Color = Color(0xffd700);
    pub const SILVER: Color = Color(0xc0c0c0);
    pub const CRIMSON: Color = Color(0xdc143c);
    pub const GREEN: Color = Color(0x2ecc71);
    pub const SKY: Color = Color(0x87ceeb);
    pub const SHADOW: Color = Color(0x1a1a2e);

    pub fn hex(&self) -> String {
        format!("#{:06x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Texture(String),
    Color(Color),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Placement {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Primitive used when a model cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Letter,
    Cone,
    Box,
    Sphere,
    Torus,
    Figure,
    Plane,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Failed to decode {asset}: {reason}")]
    Decode { asset: String, reason: String },

    #[error("Surface unavailable")]
    Unavailable,
}

#[async_trait]
pub trait SceneSurface: Send + Sync {
    fn set_background(&self, background: Background);

    /// Loads a model. Failures are returned, never panicked on.
    async fn add_model(
        &self,
        asset: &str,
        placement: Placement,
    ) -> Result<ObjectHandle, LoadError>;

    /// Adds a primitive that always succeeds.
    fn add_placeholder(&self, shape: Shape, color: Color, placement: Placement) -> ObjectHandle;

    fn spawn_particles(&self, position: Vec3, count: usize, color: Color) -> Vec<ObjectHandle>;

    fn remove(&self, handle: ObjectHandle);

    fn set_property(&self, handle: ObjectHandle, property: Property, value: Vec3);

    /// Current value, or `None` when the object no longer exists.
    fn property(&self, handle: ObjectHandle, property: Property) -> Option<Vec3>;

    /// Removes every non-permanent object.
    fn clear(&self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicOptions {
    pub fade_in: Duration,
    pub volume: f32,
    pub looped: bool,
}

impl Default for MusicOptions {
    fn default() -> Self {
        Self {
            fade_in: Duration::from_millis(1000),
            volume: 0.5,
            looped: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SfxOptions {
    pub volume: f32,
    pub rate: f32,
}

impl Default for SfxOptions {
    fn default() -> Self {
        Self {
            volume: 0.7,
            rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceOptions {
    pub volume: f32,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self { volume: 0.9 }
    }
}

pub trait AudioSurface: Send + Sync {
    fn play_music(&self, key: &str, options: MusicOptions) -> Result<AudioHandle, LoadError>;
    fn play_sfx(&self, key: &str, options: SfxOptions) -> Result<AudioHandle, LoadError>;
    fn play_voice(&self, key: &str, options: VoiceOptions) -> Result<AudioHandle, LoadError>;
    fn stop_music(&self, fade_out: Duration);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pub label: String,
    pub value: u32,
    pub total: Option<u32>,
}

impl Counter {
    pub fn new(label: impl Into<String>, value: u32) -> Self {
        Self {
            label: label.into(),
            value,
            total: None,
        }
    }

    pub fn of(mut self, total: u32) -> Self {
        self.total = Some(total);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardView {
    pub size: usize,
    pub player: (usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// Overlay, text and widget layer drawn above the scene.
pub trait PresentationSurface: Send + Sync {
    fn show_text(&self, text: &str, secondary: Option<&str>);
    fn hide_text(&self);

    /// Transition overlay opacity, 0 clear and 1 fully opaque.
    fn set_overlay(&self, opacity: f32);
    fn overlay(&self) -> f32;
    fn set_overlay_color(&self, color: Color);

    fn show_phase_title(&self, phase: PhaseId, title: &str);

    fn open_gate(&self, gate: GateId, interaction: &Interaction);
    fn close_gate(&self, gate: GateId);

    fn show_counter(&self, counter: &Counter);
    fn hide_counter(&self);
    fn show_board(&self, board: &BoardView);
    fn hide_board(&self);

    fn show_toast(&self, message: &str, kind: ToastKind);
    fn prompt_code(&self, instruction: &str);
    fn show_fatal(&self, message: &str);
}

/// The three capabilities injected into every phase.
#[derive(Clone)]
pub struct Surfaces {
    pub scene: Arc<dyn SceneSurface>,
    pub audio: Arc<dyn AudioSurface>,
    pub presentation: Arc<dyn PresentationSurface>,
}

impl Surfaces {
    pub fn new(
        scene: Arc<dyn SceneSurface>,
        audio: Arc<dyn AudioSurface>,
        presentation: Arc<dyn PresentationSurface>,
    ) -> Self {
        Self {
            scene,
            audio,
            presentation,
        }
    }
}

impl fmt::Debug for Surfaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surfaces").finish_non_exhaustive()
    }
}

/// Tween target for one scene object.
pub struct SceneObject {
    scene: Arc<dyn SceneSurface>,
    handle: ObjectHandle,
}

impl SceneObject {
    pub fn new(scene: Arc<dyn SceneSurface>, handle: ObjectHandle) -> Self {
        Self { scene, handle }
    }
}

impl TweenTarget for SceneObject {
    fn current(&self, property: Property) -> Vec3 {
        self.scene
            .property(self.handle, property)
            .unwrap_or(match property {
                Property::Scale => Vec3::ONE,
                Property::Opacity | Property::Intensity => Vec3::X,
                Property::Position | Property::Rotation => Vec3::ZERO,
            })
    }

    fn apply(&self, property: Property, value: Vec3) {
        self.scene.set_property(self.handle, property, value);
    }
}

/// Tween target for the transition overlay. Only opacity is meaningful.
pub struct Overlay {
    presentation: Arc<dyn PresentationSurface>,
}

impl Overlay {
    pub fn new(presentation: Arc<dyn PresentationSurface>) -> Self {
        Self { presentation }
    }
}

impl TweenTarget for Overlay {
    fn current(&self, _property: Property) -> Vec3 {
        Vec3::new(self.presentation.overlay(), 0.0, 0.0)
    }

    fn apply(&self, property: Property, value: Vec3) {
        if property == Property::Opacity {
            self.presentation.set_overlay(value.x.clamp(0.0, 1.0));
        }
    }
}
