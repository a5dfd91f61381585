//! Terminal rendition of the scene, audio and presentation surfaces.
//!
//! The scene is not drawn; objects are kept by handle so tweens have
//! something to drive and object hunts can list what is clickable.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use aurora_core::PhaseId;
use colored::Colorize;
use director::animation::Property;
use director::{
    AudioHandle, AudioSurface, Background, BoardView, Color, Counter, GateId, Interaction,
    LoadError, MusicOptions, ObjectHandle, Placement, PresentationSurface, SceneSurface,
    SfxOptions, Shape, Surfaces, ToastKind, VoiceOptions,
};
use glam::Vec3;
use tracing::debug;

struct SceneObject {
    label: String,
    properties: HashMap<Property, Vec3>,
}

#[derive(Default)]
struct ConsoleState {
    next_object: u64,
    next_audio: u64,
    objects: BTreeMap<ObjectHandle, SceneObject>,
    overlay: f32,
}

impl ConsoleState {
    fn add(&mut self, label: String, placement: Placement) -> ObjectHandle {
        self.next_object += 1;
        let handle = ObjectHandle(self.next_object);
        self.objects.insert(
            handle,
            SceneObject {
                label,
                properties: HashMap::from([
                    (Property::Position, placement.position),
                    (Property::Rotation, placement.rotation),
                    (Property::Scale, placement.scale),
                ]),
            },
        );
        handle
    }

    fn audio(&mut self) -> AudioHandle {
        self.next_audio += 1;
        AudioHandle(self.next_audio)
    }

    fn label(&self, handle: ObjectHandle) -> String {
        self.objects
            .get(&handle)
            .map(|object| object.label.clone())
            .unwrap_or_else(|| "gone".to_string())
    }
}

/// Prints the journey to stdout.
#[derive(Clone, Default)]
pub struct ConsoleSurfaces {
    state: Arc<Mutex<ConsoleState>>,
}

impl ConsoleSurfaces {
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

    fn state(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn render_options(options: &[String]) {
    for (index, option) in options.iter().enumerate() {
        println!("  {} {}", format!("[{index}]").cyan(), option);
    }
}

/// Grid with the player marked; row 0 on top.
pub fn render_board(board: &BoardView) -> String {
    let mut rows = Vec::with_capacity(board.size);
    for y in 0..board.size {
        let row: String = (0..board.size)
            .map(|x| if (x, y) == board.player { '@' } else { '.' })
            .collect();
        rows.push(row);
    }
    rows.join("\n")
}

#[async_trait]
impl SceneSurface for ConsoleSurfaces {
    fn set_background(&self, background: Background) {
        match background {
            Background::Texture(name) => debug!(texture = %name, "Background"),
            Background::Color(color) => debug!(color = %color.hex(), "Background"),
        }
    }

    async fn add_model(
        &self,
        asset: &str,
        placement: Placement,
    ) -> Result<ObjectHandle, LoadError> {
        let handle = self.state().add(asset.to_string(), placement);
        debug!(asset, handle = %handle, "Model placed");
        Ok(handle)
    }

    fn add_placeholder(&self, shape: Shape, color: Color, placement: Placement) -> ObjectHandle {
        let label = format!("{} {:?}", color.hex(), shape).to_lowercase();
        self.state().add(label, placement)
    }

    fn spawn_particles(&self, position: Vec3, count: usize, _color: Color) -> Vec<ObjectHandle> {
        let mut state = self.state();
        (0..count)
            .map(|_| state.add("particle".to_string(), Placement::at(position)))
            .collect()
    }

    fn remove(&self, handle: ObjectHandle) {
        self.state().objects.remove(&handle);
    }

    fn set_property(&self, handle: ObjectHandle, property: Property, value: Vec3) {
        if let Some(object) = self.state().objects.get_mut(&handle) {
            object.properties.insert(property, value);
        }
    }

    fn property(&self, handle: ObjectHandle, property: Property) -> Option<Vec3> {
        self.state()
            .objects
            .get(&handle)
            .and_then(|object| object.properties.get(&property).copied())
    }

    fn clear(&self) {
        self.state().objects.clear();
    }
}

impl AudioSurface for ConsoleSurfaces {
    fn play_music(&self, key: &str, options: MusicOptions) -> Result<AudioHandle, LoadError> {
        debug!(track = key, looped = options.looped, "Music");
        Ok(self.state().audio())
    }

    fn play_sfx(&self, key: &str, _options: SfxOptions) -> Result<AudioHandle, LoadError> {
        debug!(sfx = key, "Sound effect");
        Ok(self.state().audio())
    }

    fn play_voice(&self, key: &str, _options: VoiceOptions) -> Result<AudioHandle, LoadError> {
        debug!(voice = key, "Voice");
        Ok(self.state().audio())
    }

    fn stop_music(&self, fade_out: Duration) {
        debug!(fade_out_ms = fade_out.as_millis() as u64, "Music stopped");
    }
}

impl PresentationSurface for ConsoleSurfaces {
    fn show_text(&self, text: &str, secondary: Option<&str>) {
        println!();
        println!("{}", text.bold());
        if let Some(secondary) = secondary {
            println!("{}", secondary.italic().dimmed());
        }
    }

    fn hide_text(&self) {}

    fn set_overlay(&self, opacity: f32) {
        self.state().overlay = opacity;
    }

    fn overlay(&self) -> f32 {
        self.state().overlay
    }

    fn set_overlay_color(&self, _color: Color) {}

    fn show_phase_title(&self, phase: PhaseId, title: &str) {
        println!();
        println!("{}", format!("=== {phase} · {title} ===").yellow().bold());
    }

    fn open_gate(&self, _gate: GateId, interaction: &Interaction) {
        match interaction {
            Interaction::Choice { options } => {
                println!("{}", "Choose one (select <i>):".cyan());
                render_options(options);
            }
            Interaction::MultiSelect { options, required } => {
                println!("{}", format!("Choose {required} (pick <i> ...):").cyan());
                render_options(options);
            }
            Interaction::Ordering { items, slots } => {
                println!(
                    "{}",
                    format!("Fill {slots} slots in order (order <i> ...):").cyan()
                );
                render_options(items);
            }
            Interaction::Confirm { label } => {
                println!("{} {}", format!("[{label}]").cyan(), "(ok)".dimmed());
            }
            Interaction::Directional => {
                println!("{}", "Move with up / down / left / right.".cyan());
            }
            Interaction::ObjectHunt { targets } => {
                let state = self.state();
                let listed: Vec<String> = targets
                    .iter()
                    .map(|handle| format!("{handle} {}", state.label(*handle)))
                    .collect();
                println!("{} {}", "Click (click <handle>):".cyan(), listed.join(", "));
            }
        }
        println!("{}", "(giveup to take the way out)".dimmed());
    }

    fn close_gate(&self, _gate: GateId) {}

    fn show_counter(&self, counter: &Counter) {
        let value = match counter.total {
            Some(total) => format!("{}/{}", counter.value, total),
            None => counter.value.to_string(),
        };
        println!("{} {}", format!("{}:", counter.label).dimmed(), value);
    }

    fn hide_counter(&self) {}

    fn show_board(&self, board: &BoardView) {
        println!("{}", render_board(board));
    }

    fn hide_board(&self) {}

    fn show_toast(&self, message: &str, kind: ToastKind) {
        let line = match kind {
            ToastKind::Info => message.blue(),
            ToastKind::Success => message.green(),
            ToastKind::Error => message.red(),
        };
        println!("{line}");
    }

    fn prompt_code(&self, instruction: &str) {
        println!();
        println!("{} {}", instruction.magenta(), "(code <CODE>)".dimmed());
    }

    fn show_fatal(&self, message: &str) {
        eprintln!();
        eprintln!("{}", message.red().bold());
    }
}
