//! The phase director: sole owner of the live phase instance.
//!
//! Phase changes are strictly ordered. The outgoing phase fades out and is
//! torn down, the scene is cleared, and only then is the incoming script
//! built, faded in and started. Anything the old phase left pending has
//! already been cancelled by the time the new one can touch the scene.

use std::sync::Arc;
use std::time::Duration;

use aurora_core::{CodeValidation, EntryReason, LifecycleState, PhaseId};
use events::{Event, EventBus};
use progress::ProgressGate;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::core::{OrderedEventEmitter, PhaseInstance, PhaseRegistry, PhaseServices};
use crate::error::{DirectorError, Result};
use crate::interaction::PlayerInput;
use crate::resources::DEFAULT_FRAME_INTERVAL;
use crate::surfaces::{Surfaces, ToastKind};
use crate::transition::Transitions;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectorConfig {
    /// Length of each fade of a phase change.
    pub transition: Duration,
    /// Pause between accepting a card and entering its phase.
    pub unlock_delay: Duration,
    /// Multiplier on every scripted duration; 0 skips all waiting.
    /// Kept within `0..=MAX_PACE` by [`DirectorConfig::with_pace`].
    pub pace: f32,
    pub frame_interval: Duration,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            transition: Duration::from_millis(500),
            unlock_delay: Duration::from_millis(1500),
            pace: 1.0,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

impl DirectorConfig {
    pub fn with_transition(mut self, transition: Duration) -> Self {
        self.transition = transition;
        self
    }

    pub fn with_unlock_delay(mut self, unlock_delay: Duration) -> Self {
        self.unlock_delay = unlock_delay;
        self
    }

    /// Slowest accepted pace.
    pub const MAX_PACE: f32 = 10.0;

    pub fn is_valid_pace(pace: f32) -> bool {
        pace.is_finite() && (0.0..=Self::MAX_PACE).contains(&pace)
    }

    /// Sets the pace. NaN and infinities fall back to 1; anything else is
    /// clamped to `0..=MAX_PACE`.
    pub fn with_pace(mut self, pace: f32) -> Self {
        self.pace = if pace.is_finite() {
            pace.clamp(0.0, Self::MAX_PACE)
        } else {
            1.0
        };
        self
    }

    /// `duration` stretched by the pace, saturating instead of overflowing.
    pub fn scale(&self, duration: Duration) -> Duration {
        scale_duration(duration, self.pace)
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }
}

pub(crate) fn scale_duration(duration: Duration, pace: f32) -> Duration {
    if !pace.is_finite() || pace <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(duration.as_secs_f64() * f64::from(pace)).unwrap_or(Duration::MAX)
}

pub enum DirectorCommand {
    RequestPhase {
        phase: PhaseId,
        reason: EntryReason,
        reply: Option<oneshot::Sender<Result<()>>>,
    },
    SubmitCode {
        raw: String,
        reply: Option<oneshot::Sender<CodeValidation>>,
    },
    Input(PlayerInput),
    Export {
        reply: oneshot::Sender<Result<Value>>,
    },
    Import {
        document: Value,
        reply: oneshot::Sender<Result<Vec<String>>>,
    },
    Reset {
        reply: oneshot::Sender<Result<()>>,
    },
    Shutdown,
}

impl DirectorCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::RequestPhase { .. } => "request_phase",
            Self::SubmitCode { .. } => "submit_code",
            Self::Input(_) => "input",
            Self::Export { .. } => "export",
            Self::Import { .. } => "import",
            Self::Reset { .. } => "reset",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Cloneable front door to a running [`PhaseDirector`].
#[derive(Clone)]
pub struct DirectorHandle {
    commands: mpsc::UnboundedSender<DirectorCommand>,
    phase: watch::Receiver<Option<PhaseId>>,
}

impl DirectorHandle {
    fn send(&self, command: DirectorCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| DirectorError::Closed)
    }

    async fn ask<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> DirectorCommand,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx))?;
        rx.await.map_err(|_| DirectorError::Closed)
    }

    /// Enters `phase` and waits until its script has started.
    pub async fn request_phase(&self, phase: PhaseId) -> Result<()> {
        self.ask(|reply| DirectorCommand::RequestPhase {
            phase,
            reason: EntryReason::Manual,
            reply: Some(reply),
        })
        .await?
    }

    /// Queues a card-less hand-over to `phase`.
    pub fn advance(&self, phase: PhaseId) -> Result<()> {
        self.send(DirectorCommand::RequestPhase {
            phase,
            reason: EntryReason::AutoAdvance,
            reply: None,
        })
    }

    /// Validates a card code. A valid code enters its phase after the
    /// unlock delay; the reply arrives before that.
    pub async fn submit_code(&self, raw: impl Into<String>) -> Result<CodeValidation> {
        let raw = raw.into();
        self.ask(|reply| DirectorCommand::SubmitCode {
            raw,
            reply: Some(reply),
        })
        .await
    }

    pub fn send_input(&self, input: PlayerInput) -> Result<()> {
        self.send(DirectorCommand::Input(input))
    }

    pub async fn export(&self) -> Result<Value> {
        self.ask(|reply| DirectorCommand::Export { reply }).await?
    }

    pub async fn import(&self, document: Value) -> Result<Vec<String>> {
        self.ask(|reply| DirectorCommand::Import { document, reply })
            .await?
    }

    pub async fn reset(&self) -> Result<()> {
        self.ask(|reply| DirectorCommand::Reset { reply }).await?
    }

    pub fn current_phase(&self) -> Option<PhaseId> {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<Option<PhaseId>> {
        self.phase.clone()
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(DirectorCommand::Shutdown)
    }
}

impl std::fmt::Debug for DirectorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorHandle")
            .field("current_phase", &self.current_phase())
            .finish()
    }
}

pub struct PhaseDirector {
    registry: PhaseRegistry,
    services: PhaseServices,
    transitions: Transitions,
    current: Option<PhaseInstance>,
    current_phase: Option<PhaseId>,
    commands: mpsc::UnboundedReceiver<DirectorCommand>,
    phase_tx: watch::Sender<Option<PhaseId>>,
}

impl PhaseDirector {
    pub fn new(
        registry: PhaseRegistry,
        surfaces: Surfaces,
        progress: Arc<ProgressGate>,
        bus: EventBus,
        config: DirectorConfig,
    ) -> Self {
        if !DirectorConfig::is_valid_pace(config.pace) {
            warn!(pace = config.pace, "Pace out of range, clamping");
        }
        let config = config.with_pace(config.pace);
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(None);
        let handle = DirectorHandle {
            commands: commands_tx,
            phase: phase_rx,
        };

        let transitions = Transitions::new(
            Arc::clone(&surfaces.presentation),
            config.scale(config.transition),
            config.frame_interval,
        );

        Self {
            registry,
            services: PhaseServices {
                surfaces,
                progress,
                director: handle,
                events: OrderedEventEmitter::new(bus),
                config,
            },
            transitions,
            current: None,
            current_phase: None,
            commands,
            phase_tx,
        }
    }

    pub fn handle(&self) -> DirectorHandle {
        self.services.director.clone()
    }

    pub fn current_phase_id(&self) -> Option<PhaseId> {
        self.current_phase
    }

    pub fn live_state(&self) -> Option<LifecycleState> {
        self.current.as_ref().map(PhaseInstance::state)
    }

    pub fn live_instance(&self) -> Option<&PhaseInstance> {
        self.current.as_ref()
    }

    pub fn progress(&self) -> &Arc<ProgressGate> {
        &self.services.progress
    }

    pub fn events(&self) -> &OrderedEventEmitter {
        &self.services.events
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.services.config
    }

    pub async fn request_phase(&mut self, phase: PhaseId) -> Result<()> {
        self.enter(phase, EntryReason::Manual).await
    }

    /// Replaces the live phase with `phase`.
    ///
    /// An unregistered phase is reported and ignored; the live phase keeps
    /// running untouched.
    pub async fn enter(&mut self, phase: PhaseId, reason: EntryReason) -> Result<()> {
        if !self.registry.contains(phase) {
            warn!(phase = %phase, "Requested phase is not implemented");
            self.services.events.emit(Event::PhaseNotImplemented {
                phase: phase.value(),
            });
            return Err(DirectorError::PhaseNotImplemented(phase));
        }

        info!(
            from = ?self.current_phase.map(PhaseId::value),
            to = %phase,
            reason = reason.as_str(),
            "Entering phase"
        );
        self.services.events.emit(Event::PhaseRequested {
            from: self.current_phase.map(PhaseId::value),
            to: phase.value(),
            reason: reason.as_str().to_string(),
        });

        match self.current.take() {
            Some(outgoing) => {
                self.transitions.fade_out().await;
                outgoing.teardown();
                drop(outgoing);
                self.services.surfaces.scene.clear();
            }
            None => self.transitions.cover(),
        }

        if let Err(e) = self.services.progress.record_entry(phase, reason).await {
            warn!(phase = %phase, error = %e, "Failed to record phase entry");
        }

        let Some(script) = self.registry.create(phase) else {
            return Err(DirectorError::PhaseNotImplemented(phase));
        };
        self.current_phase = Some(phase);
        self.phase_tx.send_replace(Some(phase));
        self.services
            .surfaces
            .presentation
            .show_phase_title(phase, phase.info().title);

        self.transitions.fade_in().await;
        self.current = Some(PhaseInstance::start(script, self.services.clone()));
        Ok(())
    }

    /// Validates a code and shows the verdict, without entering the phase.
    pub async fn check_code(&mut self, raw: &str) -> CodeValidation {
        let validation = self.services.progress.validate_code(raw).await;
        let presentation = &self.services.surfaces.presentation;

        match (validation.phase, validation.rejection) {
            (Some(phase), _) if validation.valid => {
                self.services.events.emit(Event::CodeAccepted {
                    phase: phase.value(),
                });
                presentation.show_toast(&validation.message, ToastKind::Success);
            }
            (_, rejection) => {
                self.services.events.emit(Event::CodeRejected {
                    reason: rejection
                        .map(|r| r.as_str())
                        .unwrap_or("unknown")
                        .to_string(),
                });
                presentation.show_toast(&validation.message, ToastKind::Error);
            }
        }

        validation
    }

    /// Validates a code and, when it is accepted, enters its phase after the
    /// unlock delay.
    pub async fn submit_code(&mut self, raw: &str) -> Result<CodeValidation> {
        let validation = self.check_code(raw).await;
        if let Some(phase) = validation.phase {
            self.enter_unlocked(phase).await?;
        }
        Ok(validation)
    }

    async fn enter_unlocked(&mut self, phase: PhaseId) -> Result<()> {
        let config = self.services.config;
        tokio::time::sleep(config.scale(config.unlock_delay)).await;
        self.enter(phase, EntryReason::Code).await
    }

    pub fn send_input(&self, input: PlayerInput) -> bool {
        match &self.current {
            Some(instance) => instance.send_input(input),
            None => {
                debug!(input = input.kind(), "No live phase for input");
                false
            }
        }
    }

    pub fn export_progress(&self) -> Result<Value> {
        Ok(self.services.progress.export()?)
    }

    /// Replaces progress and resumes at the imported current phase.
    pub async fn import_progress(&mut self, document: &Value) -> Result<Vec<String>> {
        let repaired = self.services.progress.import(document).await?;
        self.services.events.emit(Event::ProgressImported);
        self.resume().await?;
        Ok(repaired)
    }

    /// Wipes progress and starts over at the letter.
    pub async fn reset_progress(&mut self) -> Result<()> {
        self.services.progress.reset_all().await?;
        self.services.events.emit(Event::ProgressReset);
        self.enter(PhaseId::LETTER, EntryReason::Manual).await
    }

    /// Enters the saved current phase, or the letter if it has no script.
    pub async fn resume(&mut self) -> Result<()> {
        let saved = self.services.progress.current_phase();
        match self.enter(saved, EntryReason::Resume).await {
            Err(DirectorError::PhaseNotImplemented(_)) if saved != PhaseId::LETTER => {
                self.enter(PhaseId::LETTER, EntryReason::Resume).await
            }
            other => other,
        }
    }

    /// Tears down the live phase without starting another.
    pub fn stop(&mut self) {
        if let Some(instance) = self.current.take() {
            instance.teardown();
        }
    }

    async fn handle_command(&mut self, command: DirectorCommand) {
        debug!(command = command.name(), "Director command");
        match command {
            DirectorCommand::RequestPhase {
                phase,
                reason,
                reply,
            } => {
                let result = self.enter(phase, reason).await;
                match reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            warn!(phase = %phase, error = %e, "Phase request failed");
                        }
                    }
                }
            }
            DirectorCommand::SubmitCode { raw, reply } => {
                let validation = self.check_code(&raw).await;
                let phase = validation.phase;
                if let Some(reply) = reply {
                    let _ = reply.send(validation);
                }
                if let Some(phase) = phase {
                    if let Err(e) = self.enter_unlocked(phase).await {
                        warn!(phase = %phase, error = %e, "Could not enter unlocked phase");
                    }
                }
            }
            DirectorCommand::Input(input) => {
                self.send_input(input);
            }
            DirectorCommand::Export { reply } => {
                let _ = reply.send(self.export_progress());
            }
            DirectorCommand::Import { document, reply } => {
                let _ = reply.send(self.import_progress(&document).await);
            }
            DirectorCommand::Reset { reply } => {
                let _ = reply.send(self.reset_progress().await);
            }
            DirectorCommand::Shutdown => {}
        }
    }

    /// Processes commands until [`DirectorHandle::shutdown`].
    pub async fn run(mut self) {
        info!(phases = self.registry.len(), "Director running");
        while let Some(command) = self.commands.recv().await {
            if matches!(command, DirectorCommand::Shutdown) {
                break;
            }
            self.handle_command(command).await;
        }
        self.stop();
        self.transitions.release();
        info!("Director stopped");
    }
}

impl std::fmt::Debug for PhaseDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseDirector")
            .field("registry", &self.registry)
            .field("current_phase", &self.current_phase)
            .field("live", &self.current)
            .finish()
    }
}
