//! In-memory surfaces that record every call in order.
//!
//! Used by the test suites to observe side-effect ordering, and handy for
//! headless runs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use aurora_core::PhaseId;
use glam::Vec3;

use crate::animation::Property;
use crate::interaction::{GateId, Interaction};
use crate::surfaces::{
    AudioHandle, AudioSurface, Background, BoardView, Color, Counter, LoadError, MusicOptions,
    ObjectHandle, Placement, PresentationSurface, SceneSurface, SfxOptions, Shape, Surfaces,
    ToastKind, VoiceOptions,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Background(Background),
    ModelAdded { asset: String, handle: ObjectHandle },
    PlaceholderAdded { shape: Shape, handle: ObjectHandle },
    ParticlesSpawned { count: usize },
    Removed(ObjectHandle),
    PropertySet { handle: ObjectHandle, property: Property },
    Cleared,
    Music(String),
    Sfx(String),
    Voice(String),
    MusicStopped,
    TextShown { text: String, secondary: Option<String> },
    TextHidden,
    Overlay(f32),
    OverlayColor(Color),
    PhaseTitle(PhaseId),
    GateOpened { gate: GateId, kind: &'static str },
    GateClosed(GateId),
    Counter(Counter),
    CounterHidden,
    Board(BoardView),
    BoardHidden,
    Toast { message: String, kind: ToastKind },
    CodePrompt(String),
    Fatal(String),
}

#[derive(Default)]
struct RecorderState {
    calls: Vec<SurfaceCall>,
    next_object: u64,
    next_audio: u64,
    objects: BTreeMap<ObjectHandle, HashMap<Property, Vec3>>,
    failing: HashSet<String>,
    gates: Vec<(GateId, Interaction)>,
    gates_opened: usize,
    text: Option<String>,
    overlay: f32,
}

impl RecorderState {
    fn object(&mut self) -> ObjectHandle {
        self.next_object += 1;
        ObjectHandle(self.next_object)
    }

    fn audio(&mut self, key: &str) -> Result<AudioHandle, LoadError> {
        if self.failing.contains(key) {
            return Err(LoadError::NotFound(key.to_string()));
        }
        self.next_audio += 1;
        Ok(AudioHandle(self.next_audio))
    }
}

/// Scene, audio and presentation surface backed by one shared log.
#[derive(Clone, Default)]
pub struct Recorder {
    state: Arc<Mutex<RecorderState>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surfaces(&self) -> Surfaces {
        Surfaces::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
        )
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: SurfaceCall) {
        self.state().calls.push(call);
    }

    /// Makes every later load of `asset` fail.
    pub fn fail_asset(&self, asset: impl Into<String>) {
        self.state().failing.insert(asset.into());
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Index of the first call matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&SurfaceCall) -> bool) -> Option<usize> {
        self.state().calls.iter().position(predicate)
    }

    pub fn texts(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::TextShown { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn toasts(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Toast { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn live_objects(&self) -> Vec<ObjectHandle> {
        self.state().objects.keys().copied().collect()
    }

    pub fn open_gates(&self) -> Vec<GateId> {
        self.state().gates.iter().map(|(gate, _)| *gate).collect()
    }

    pub fn gates_opened(&self) -> usize {
        self.state().gates_opened
    }

    /// Most recently opened gate that is still open.
    pub fn current_gate(&self) -> Option<(GateId, Interaction)> {
        self.state().gates.last().cloned()
    }

    pub fn current_text(&self) -> Option<String> {
        self.state().text.clone()
    }

    pub fn overlay_opacity(&self) -> f32 {
        self.state().overlay
    }

    /// Polls until more than `seen` gates have been opened and one is open.
    pub async fn wait_for_gate(
        &self,
        seen: usize,
        within: Duration,
    ) -> Option<(GateId, Interaction)> {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            if self.gates_opened() > seen {
                if let Some(gate) = self.current_gate() {
                    return Some(gate);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Polls `predicate` every 10 ms of (possibly virtual) time.
    pub async fn wait_until(&self, within: Duration, predicate: impl Fn(&Recorder) -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            if predicate(self) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl SceneSurface for Recorder {
    fn set_background(&self, background: Background) {
        self.record(SurfaceCall::Background(background));
    }

    async fn add_model(
        &self,
        asset: &str,
        placement: Placement,
    ) -> Result<ObjectHandle, LoadError> {
        let mut state = self.state();
        if state.failing.contains(asset) {
            return Err(LoadError::NotFound(asset.to_string()));
        }
        let handle = state.object();
        state.objects.insert(
            handle,
            HashMap::from([
                (Property::Position, placement.position),
                (Property::Rotation, placement.rotation),
                (Property::Scale, placement.scale),
            ]),
        );
        state.calls.push(SurfaceCall::ModelAdded {
            asset: asset.to_string(),
            handle,
        });
        Ok(handle)
    }

    fn add_placeholder(&self, shape: Shape, _color: Color, placement: Placement) -> ObjectHandle {
        let mut state = self.state();
        let handle = state.object();
        state.objects.insert(
            handle,
            HashMap::from([
                (Property::Position, placement.position),
                (Property::Scale, placement.scale),
            ]),
        );
        state
            .calls
            .push(SurfaceCall::PlaceholderAdded { shape, handle });
        handle
    }

    fn spawn_particles(&self, position: Vec3, count: usize, _color: Color) -> Vec<ObjectHandle> {
        let mut state = self.state();
        let handles: Vec<ObjectHandle> = (0..count).map(|_| state.object()).collect();
        for handle in &handles {
            state
                .objects
                .insert(*handle, HashMap::from([(Property::Position, position)]));
        }
        state.calls.push(SurfaceCall::ParticlesSpawned { count });
        handles
    }

    fn remove(&self, handle: ObjectHandle) {
        let mut state = self.state();
        if state.objects.remove(&handle).is_some() {
            state.calls.push(SurfaceCall::Removed(handle));
        }
    }

    fn set_property(&self, handle: ObjectHandle, property: Property, value: Vec3) {
        let mut state = self.state();
        if let Some(properties) = state.objects.get_mut(&handle) {
            properties.insert(property, value);
            state
                .calls
                .push(SurfaceCall::PropertySet { handle, property });
        }
    }

    fn property(&self, handle: ObjectHandle, property: Property) -> Option<Vec3> {
        self.state()
            .objects
            .get(&handle)
            .and_then(|properties| properties.get(&property).copied())
    }

    fn clear(&self) {
        let mut state = self.state();
        state.objects.clear();
        state.calls.push(SurfaceCall::Cleared);
    }
}

impl AudioSurface for Recorder {
    fn play_music(&self, key: &str, _options: MusicOptions) -> Result<AudioHandle, LoadError> {
        let mut state = self.state();
        let handle = state.audio(key)?;
        state.calls.push(SurfaceCall::Music(key.to_string()));
        Ok(handle)
    }

    fn play_sfx(&self, key: &str, _options: SfxOptions) -> Result<AudioHandle, LoadError> {
        let mut state = self.state();
        let handle = state.audio(key)?;
        state.calls.push(SurfaceCall::Sfx(key.to_string()));
        Ok(handle)
    }

    fn play_voice(&self, key: &str, _options: VoiceOptions) -> Result<AudioHandle, LoadError> {
        let mut state = self.state();
        let handle = state.audio(key)?;
        state.calls.push(SurfaceCall::Voice(key.to_string()));
        Ok(handle)
    }

    fn stop_music(&self, _fade_out: Duration) {
        self.record(SurfaceCall::MusicStopped);
    }
}

impl PresentationSurface for Recorder {
    fn show_text(&self, text: &str, secondary: Option<&str>) {
        let mut state = self.state();
        state.text = Some(text.to_string());
        state.calls.push(SurfaceCall::TextShown {
            text: text.to_string(),
            secondary: secondary.map(str::to_string),
        });
    }

    fn hide_text(&self) {
        let mut state = self.state();
        state.text = None;
        state.calls.push(SurfaceCall::TextHidden);
    }

    fn set_overlay(&self, opacity: f32) {
        let mut state = self.state();
        state.overlay = opacity;
        state.calls.push(SurfaceCall::Overlay(opacity));
    }

    fn overlay(&self) -> f32 {
        self.state().overlay
    }

    fn set_overlay_color(&self, color: Color) {
        self.record(SurfaceCall::OverlayColor(color));
    }

    fn show_phase_title(&self, phase: PhaseId, _title: &str) {
        self.record(SurfaceCall::PhaseTitle(phase));
    }

    fn open_gate(&self, gate: GateId, interaction: &Interaction) {
        let mut state = self.state();
        state.gates.push((gate, interaction.clone()));
        state.gates_opened += 1;
        state.calls.push(SurfaceCall::GateOpened {
            gate,
            kind: interaction.kind(),
        });
    }

    fn close_gate(&self, gate: GateId) {
        let mut state = self.state();
        let before = state.gates.len();
        state.gates.retain(|(open, _)| *open != gate);
        if state.gates.len() != before {
            state.calls.push(SurfaceCall::GateClosed(gate));
        }
    }

    fn show_counter(&self, counter: &Counter) {
        self.record(SurfaceCall::Counter(counter.clone()));
    }

    fn hide_counter(&self) {
        self.record(SurfaceCall::CounterHidden);
    }

    fn show_board(&self, board: &BoardView) {
        self.record(SurfaceCall::Board(*board));
    }

    fn hide_board(&self) {
        self.record(SurfaceCall::BoardHidden);
    }

    fn show_toast(&self, message: &str, kind: ToastKind) {
        self.record(SurfaceCall::Toast {
            message: message.to_string(),
            kind,
        });
    }

    fn prompt_code(&self, instruction: &str) {
        self.record(SurfaceCall::CodePrompt(instruction.to_string()));
    }

    fn show_fatal(&self, message: &str) {
        self.record(SurfaceCall::Fatal(message.to_string()));
    }
}
