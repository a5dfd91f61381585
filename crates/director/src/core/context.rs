//! The runtime a phase script is written against.
//!
//! Every suspension primitive here (`pause`, `narrate`, `animate`, `gate`)
//! returns [`PhaseError::Cancelled`] once the phase is torn down, and every
//! synchronous effect is a silent no-op afterwards. Scripts propagate with
//! `?` and never check the liveness flag by hand.

use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use aurora_core::content::Line;
use aurora_core::{LifecycleState, PhaseId, PhaseInfo};
use events::Event;
use glam::Vec3;
use progress::ProgressGate;
use rand::Rng;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::events::OrderedEventEmitter;
use crate::animation::{Easing, Property, Tween, TweenTarget};
use crate::director::{DirectorConfig, DirectorHandle};
use crate::error::{PhaseError, PhaseResult};
use crate::interaction::{GateId, GateOutcome, GatePolicy, Interaction, PlayerInput};
use crate::resources::{EffectHandle, OwnedResources, ResourceLedger};
use crate::state_machine::LifecycleMachine;
use crate::surfaces::{
    AudioHandle, Background, BoardView, Color, Counter, MusicOptions, ObjectHandle, Overlay,
    Placement, SceneObject, SfxOptions, Shape, Surfaces, ToastKind, VoiceOptions,
};

/// Shared collaborators handed to every phase the director starts.
#[derive(Clone)]
pub struct PhaseServices {
    pub surfaces: Surfaces,
    pub progress: Arc<ProgressGate>,
    pub director: DirectorHandle,
    pub events: OrderedEventEmitter,
    pub config: DirectorConfig,
}

pub struct PhaseContext {
    phase: PhaseId,
    services: PhaseServices,
    ledger: ResourceLedger,
    lifecycle: Mutex<LifecycleState>,
    owned: Mutex<OwnedResources>,
    inputs: tokio::sync::Mutex<mpsc::UnboundedReceiver<PlayerInput>>,
    this: Weak<PhaseContext>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PhaseContext {
    pub fn new(
        phase: PhaseId,
        services: PhaseServices,
        inputs: mpsc::UnboundedReceiver<PlayerInput>,
    ) -> Arc<Self> {
        let ledger = ResourceLedger::with_frame_interval(services.config.frame_interval);
        Arc::new_cyclic(|this| Self {
            phase,
            services,
            ledger,
            lifecycle: Mutex::new(LifecycleState::Constructed),
            owned: Mutex::new(OwnedResources::new()),
            inputs: tokio::sync::Mutex::new(inputs),
            this: this.clone(),
        })
    }

    pub fn phase(&self) -> PhaseId {
        self.phase
    }

    pub fn info(&self) -> &'static PhaseInfo {
        self.phase.info()
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.services.surfaces
    }

    pub fn progress(&self) -> &ProgressGate {
        &self.services.progress
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn now(&self) -> Instant {
        Instant::now()
    }

    pub(crate) fn emit(&self, event: Event) {
        self.services.events.emit(event);
    }

    fn owned(&self) -> MutexGuard<'_, OwnedResources> {
        lock(&self.owned)
    }

    // -- Lifecycle --

    pub fn state(&self) -> LifecycleState {
        *lock(&self.lifecycle)
    }

    pub fn is_destroyed(&self) -> bool {
        self.ledger.is_released() || !self.state().is_live()
    }

    /// Runs `f` while holding the lifecycle lock, so teardown cannot slip in
    /// between the liveness check and the surface call. `f` must not touch
    /// the lifecycle again.
    fn while_live<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let state = lock(&self.lifecycle);
        if self.ledger.is_released() || !state.is_live() {
            return None;
        }
        let result = f();
        drop(state);
        Some(result)
    }

    /// `Err(Cancelled)` once the phase is torn down.
    pub fn checkpoint(&self) -> PhaseResult<()> {
        if self.is_destroyed() {
            Err(PhaseError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Moves the lifecycle forward. Returns `false` for a disallowed move.
    pub(crate) fn transition(&self, to: LifecycleState) -> bool {
        let mut state = lock(&self.lifecycle);
        match LifecycleMachine::validate_transition(&state, &to) {
            Ok(()) => {
                *state = to;
                true
            }
            Err(e) => {
                debug!(phase = %self.phase, error = %e, "Lifecycle transition skipped");
                false
            }
        }
    }

    /// Releases the ledger, marks the phase destroyed and removes everything
    /// it created. Idempotent, and safe before `initialize` ever ran.
    pub fn teardown(&self) {
        self.ledger.release_all();

        let was_live = {
            let mut state = lock(&self.lifecycle);
            let was_live = state.is_live();
            *state = LifecycleState::Destroyed;
            was_live
        };
        if !was_live {
            return;
        }

        self.owned().release(&self.services.surfaces);
        self.emit(Event::PhaseTornDown {
            phase: self.phase.value(),
        });
        info!(phase = %self.phase, "Phase torn down");
    }

    // -- Pacing --

    /// `duration` stretched by the configured pace.
    pub fn scaled(&self, duration: Duration) -> Duration {
        self.services.config.scale(duration)
    }

    pub async fn wait(&self, duration: Duration) -> PhaseResult<()> {
        self.checkpoint()?;
        self.ledger.await_delay(self.scaled(duration)).await?;
        self.checkpoint()
    }

    pub async fn pause(&self, ms: u64) -> PhaseResult<()> {
        self.wait(Duration::from_millis(ms)).await
    }

    // -- Text --

    /// Shows a line, holds it, hides it. Silent lines are plain pauses.
    pub async fn narrate(&self, line: &Line) -> PhaseResult<()> {
        self.checkpoint()?;
        if line.is_silence() {
            self.hide_text();
            return self.pause(line.hold_ms).await;
        }

        if let Some(voice) = line.voice {
            self.voice(voice);
        }
        self.show_text(line.text, line.verse);
        self.pause(line.hold_ms).await?;
        self.hide_text();
        Ok(())
    }

    pub async fn narrate_all(&self, lines: &[Line]) -> PhaseResult<()> {
        for line in lines {
            self.narrate(line).await?;
        }
        Ok(())
    }

    pub fn show_text(&self, text: &str, secondary: Option<&str>) {
        self.while_live(|| {
            self.services.surfaces.presentation.show_text(text, secondary);
            self.owned().set_text(true);
        });
    }

    pub fn hide_text(&self) {
        self.while_live(|| {
            self.services.surfaces.presentation.hide_text();
            self.owned().set_text(false);
        });
    }

    pub fn toast(&self, message: &str, kind: ToastKind) {
        self.while_live(|| self.services.surfaces.presentation.show_toast(message, kind));
    }

    // -- Widgets --

    pub fn counter(&self, counter: &Counter) {
        self.while_live(|| {
            self.services.surfaces.presentation.show_counter(counter);
            self.owned().set_counter(true);
        });
    }

    pub fn hide_counter(&self) {
        self.while_live(|| {
            self.services.surfaces.presentation.hide_counter();
            self.owned().set_counter(false);
        });
    }

    pub fn board(&self, board: &BoardView) {
        self.while_live(|| {
            self.services.surfaces.presentation.show_board(board);
            self.owned().set_board(true);
        });
    }

    pub fn hide_board(&self) {
        self.while_live(|| {
            self.services.surfaces.presentation.hide_board();
            self.owned().set_board(false);
        });
    }

    pub fn set_background(&self, background: Background) {
        self.while_live(|| self.services.surfaces.scene.set_background(background));
    }

    /// Sets the full-screen overlay without animating it.
    pub fn set_overlay(&self, opacity: f32) {
        self.while_live(|| self.services.surfaces.presentation.set_overlay(opacity));
    }

    // -- Audio --

    pub fn music(&self, key: &str) -> Option<AudioHandle> {
        self.effect("music", || {
            self.services
                .surfaces
                .audio
                .play_music(key, MusicOptions::default())
        })
    }

    pub fn sfx(&self, key: &str) -> Option<AudioHandle> {
        self.sfx_with(key, SfxOptions::default())
    }

    pub fn sfx_with(&self, key: &str, options: SfxOptions) -> Option<AudioHandle> {
        self.effect("sfx", || self.services.surfaces.audio.play_sfx(key, options))
    }

    pub fn voice(&self, key: &str) -> Option<AudioHandle> {
        self.effect("voice", || {
            self.services
                .surfaces
                .audio
                .play_voice(key, VoiceOptions::default())
        })
    }

    pub fn stop_music(&self, fade_out: Duration) {
        let fade_out = self.scaled(fade_out);
        self.while_live(|| self.services.surfaces.audio.stop_music(fade_out));
    }

    // -- Scene --

    /// Loads a model, substituting a placeholder primitive when it fails.
    pub async fn load_model(
        &self,
        asset: &str,
        placement: Placement,
        fallback: Shape,
        color: Color,
    ) -> PhaseResult<ObjectHandle> {
        self.checkpoint()?;
        let scene = &self.services.surfaces.scene;

        let handle = match scene.add_model(asset, placement).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(
                    phase = %self.phase,
                    asset,
                    error = %e,
                    "Model unavailable, using placeholder"
                );
                scene.add_placeholder(fallback, color, placement)
            }
        };

        match self.while_live(|| self.owned().track_object(handle)) {
            Some(()) => Ok(handle),
            None => {
                scene.remove(handle);
                Err(PhaseError::Cancelled)
            }
        }
    }

    pub fn placeholder(
        &self,
        shape: Shape,
        color: Color,
        placement: Placement,
    ) -> Option<ObjectHandle> {
        self.while_live(|| {
            let handle = self
                .services
                .surfaces
                .scene
                .add_placeholder(shape, color, placement);
            self.owned().track_object(handle);
            handle
        })
    }

    /// Bursts particles that drift outwards and disappear after `lifetime`.
    pub fn particles(&self, position: Vec3, count: usize, color: Color, lifetime: Duration) {
        let spawned = self.while_live(|| {
            let handles = self
                .services
                .surfaces
                .scene
                .spawn_particles(position, count, color);
            self.owned().track_objects(handles.iter().copied());
            handles
        });
        let Some(handles) = spawned else {
            return;
        };

        let mut rng = rand::thread_rng();
        for handle in &handles {
            let drift = Vec3::new(
                rng.gen_range(-1.5..1.5),
                rng.gen_range(0.0..2.0),
                rng.gen_range(-1.5..1.5),
            );
            self.animate_detached(
                *handle,
                Tween::from_to(Property::Position, position, position + drift, lifetime)
                    .with_easing(Easing::CubicOut),
            );
        }

        self.after(lifetime, move |ctx| {
            for handle in handles {
                ctx.remove(handle);
            }
        });
    }

    pub fn remove(&self, handle: ObjectHandle) {
        self.while_live(|| {
            self.services.surfaces.scene.remove(handle);
            self.owned().forget_object(handle);
        });
    }

    pub fn set_property(&self, handle: ObjectHandle, property: Property, value: Vec3) {
        self.while_live(|| {
            self.services
                .surfaces
                .scene
                .set_property(handle, property, value)
        });
    }

    fn target(&self, handle: ObjectHandle) -> Arc<dyn TweenTarget> {
        Arc::new(SceneObject::new(
            Arc::clone(&self.services.surfaces.scene),
            handle,
        ))
    }

    /// Runs a tween on a scene object until it finishes.
    pub async fn animate(&self, handle: ObjectHandle, tween: Tween) -> PhaseResult<()> {
        self.checkpoint()?;
        let tween = tween.scaled(self.services.config.pace);
        self.ledger
            .await_animation(self.target(handle), tween)
            .await?;
        self.checkpoint()
    }

    /// Starts a tween without waiting for it; idle loops use this.
    pub fn animate_detached(&self, handle: ObjectHandle, tween: Tween) -> Option<EffectHandle> {
        if self.is_destroyed() {
            return None;
        }
        let tween = tween.scaled(self.services.config.pace);
        self.ledger.animate(self.target(handle), tween)
    }

    pub async fn fade_overlay(&self, to: f32, duration: Duration) -> PhaseResult<()> {
        self.checkpoint()?;
        let overlay = Arc::new(Overlay::new(Arc::clone(
            &self.services.surfaces.presentation,
        )));
        let tween = Tween::opacity(to, duration).scaled(self.services.config.pace);
        self.ledger.await_animation(overlay, tween).await?;
        self.checkpoint()
    }

    /// Full-screen flash of `color` that fades back out.
    pub async fn flash(&self, color: Color, hold: Duration, fade: Duration) -> PhaseResult<()> {
        let presentation = &self.services.surfaces.presentation;
        self.while_live(|| {
            presentation.set_overlay_color(color);
            presentation.set_overlay(1.0);
        })
        .ok_or(PhaseError::Cancelled)?;
        self.wait(hold).await?;
        self.fade_overlay(0.0, fade).await
    }

    // -- Effects --

    /// Runs a fallible side effect, logging and skipping it on failure.
    pub fn effect<T, E, F>(&self, label: &str, f: F) -> Option<T>
    where
        E: Display,
        F: FnOnce() -> Result<T, E>,
    {
        match self.while_live(f)? {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(phase = %self.phase, effect = label, error = %e, "Effect failed, skipping");
                None
            }
        }
    }

    /// Runs `f` after `delay` unless the phase is torn down first.
    pub fn after<F>(&self, delay: Duration, f: F) -> Option<EffectHandle>
    where
        F: FnOnce(&PhaseContext) + Send + 'static,
    {
        let this = self.this.clone();
        self.ledger.schedule_delay(self.scaled(delay), move || {
            if let Some(ctx) = this.upgrade() {
                if !ctx.is_destroyed() {
                    f(&ctx);
                }
            }
        })
    }

    // -- Interaction --

    /// Presents `interaction` and suspends until a qualifying input, the
    /// policy's timeout or a give-up.
    ///
    /// Inputs that do not fit the gate are ignored and the gate stays open.
    pub async fn gate(
        &self,
        interaction: Interaction,
        policy: GatePolicy,
    ) -> PhaseResult<GateOutcome> {
        let policy = policy.normalized();
        let deadline = policy.timeout.map(|timeout| self.deadline(timeout));
        self.run_gate(interaction, deadline, policy.allow_give_up)
            .await
    }

    /// Gate that times out at an absolute `deadline`, with give-up offered.
    ///
    /// Countdown beats reopen a gate several times against one deadline.
    pub async fn gate_until(
        &self,
        interaction: Interaction,
        deadline: Instant,
    ) -> PhaseResult<GateOutcome> {
        self.run_gate(interaction, Some(deadline), true).await
    }

    /// The instant `after` from now, stretched by the pace.
    pub fn deadline(&self, after: Duration) -> Instant {
        Instant::now() + self.scaled(after)
    }

    async fn run_gate(
        &self,
        interaction: Interaction,
        deadline: Option<Instant>,
        allow_give_up: bool,
    ) -> PhaseResult<GateOutcome> {
        self.checkpoint()?;

        let mut inputs = self.inputs.lock().await;
        while inputs.try_recv().is_ok() {}
        self.checkpoint()?;

        let gate = GateId::next();
        self.while_live(|| {
            self.services
                .surfaces
                .presentation
                .open_gate(gate, &interaction);
            self.owned().track_gate(gate);
        })
        .ok_or(PhaseError::Cancelled)?;
        self.emit(Event::GateOpened {
            phase: self.phase.value(),
            gate: gate.0,
            kind: interaction.kind().to_string(),
        });
        debug!(phase = %self.phase, gate = %gate, kind = interaction.kind(), "Gate opened");

        let token = self.ledger.token();

        let outcome = loop {
            let input = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(PhaseError::Cancelled),
                _ = deadline_elapsed(deadline) => break GateOutcome::TimedOut,
                input = inputs.recv() => input,
            };

            match input {
                None => return Err(PhaseError::Cancelled),
                Some(PlayerInput::GiveUp) if allow_give_up => break GateOutcome::GaveUp,
                Some(PlayerInput::GiveUp) => {
                    debug!(gate = %gate, "Give-up not offered by this gate");
                }
                Some(input) if interaction.accepts(&input) => {
                    break GateOutcome::Responded(input)
                }
                Some(input) => {
                    debug!(gate = %gate, input = input.kind(), "Input does not fit the gate");
                }
            }
        };
        drop(inputs);

        self.close_gate(gate);
        self.emit(Event::GateClosed {
            phase: self.phase.value(),
            gate: gate.0,
            outcome: outcome.as_str().to_string(),
        });
        debug!(phase = %self.phase, gate = %gate, outcome = outcome.as_str(), "Gate closed");

        self.checkpoint()?;
        Ok(outcome)
    }

    fn close_gate(&self, gate: GateId) {
        self.while_live(|| {
            self.services.surfaces.presentation.close_gate(gate);
            self.owned().forget_gate(gate);
        });
    }

    // -- Completion --

    /// Persists the completion record and marks the phase completed.
    ///
    /// A failed save is logged; the in-memory record survives it.
    pub async fn complete(&self, payload: Map<String, Value>) -> PhaseResult<()> {
        self.checkpoint()?;
        if let Err(e) = self
            .services
            .progress
            .complete_phase(self.phase, payload)
            .await
        {
            warn!(phase = %self.phase, error = %e, "Failed to persist phase completion");
        }
        self.checkpoint()?;

        if self.transition(LifecycleState::Completed) {
            self.emit(Event::PhaseCompleted {
                phase: self.phase.value(),
            });
        }
        Ok(())
    }

    /// Asks the director to enter `next` without a card.
    pub fn advance_to(&self, next: PhaseId) -> PhaseResult<()> {
        self.checkpoint()?;
        if let Err(e) = self.services.director.advance(next) {
            warn!(phase = %self.phase, next = %next, error = %e, "Could not request next phase");
        }
        Ok(())
    }

    pub fn prompt_next_card(&self) {
        if let Some(prompt) = self.info().next_card_prompt {
            self.while_live(|| self.services.surfaces.presentation.prompt_code(prompt));
        }
    }

    /// Completion beat: persist, then auto-advance or ask for the next card.
    pub async fn finish(&self, payload: Map<String, Value>) -> PhaseResult<()> {
        self.complete(payload).await?;
        match self.info().auto_advance_to {
            Some(next) => self.advance_to(next),
            None => {
                self.prompt_next_card();
                Ok(())
            }
        }
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl Drop for PhaseContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for PhaseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseContext")
            .field("phase", &self.phase)
            .field("state", &self.state())
            .field("ledger", &self.ledger)
            .finish()
    }
}
